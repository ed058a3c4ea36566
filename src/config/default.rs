// src/config/default.rs

/// Built-in command table, used when no config file is found and printed by
/// `gazer -y`.
pub const DEFAULT_CONFIG: &str = r#"# Gazer configuration
# priority: default < ~/.gazer.toml < ~/.config/gazer/gazer.toml < ./.gazer.toml < -f option

[log]
start = "[{{command}}]{{step}}"
end = "({{elapsed_ms}}ms)"

[[commands]]
ext = ".bash"
cmd = 'bash "{{file}}"'

[[commands]]
ext = ".cpp"
cmd = '''
gcc "{{file}}" -o"{{base0}}.out"
./"{{base0}}.out"
'''

[[commands]]
ext = ".d"
cmd = 'dmd -run "{{file}}"'

[[commands]]
ext = ".go"
cmd = 'go run "{{file}}"'

[[commands]]
ext = ".groovy"
cmd = 'groovy "{{file}}"'

[[commands]]
ext = ".java"
cmd = 'java "{{file}}"'

[[commands]]
ext = ".js"
cmd = 'node "{{file}}"'

[[commands]]
ext = ".kts"
cmd = 'kotlinc -script "{{file}}"'

[[commands]]
ext = ".php"
cmd = 'php "{{file}}"'

[[commands]]
ext = ".py"
cmd = 'python "{{file}}"'

[[commands]]
ext = ".rb"
cmd = 'ruby "{{file}}"'

[[commands]]
ext = ".rs"
cmd = '''
rustc "{{file}}" -o"{{base0}}.out"
./"{{base0}}.out"
'''

[[commands]]
ext = ".sh"
cmd = 'sh "{{file}}"'

[[commands]]
ext = ".ts"
cmd = '''
tsc "{{file}}" --out "{{base0}}.out"
node ./"{{base0}}.out"
'''

[[commands]]
re = "^Dockerfile$"
cmd = 'docker build -f "{{file}}" .'
"#;
