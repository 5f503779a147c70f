use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

fn parse_env_lines(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        if let Some(eq) = s.find('=') {
            let key = s[..eq].trim();
            let mut val = s[eq + 1..].to_string();
            // Remove surrounding quotes if present
            if val.len() >= 2
                && ((val.starts_with('"') && val.ends_with('"'))
                    || (val.starts_with('\'') && val.ends_with('\'')))
            {
                val = val[1..val.len() - 1].to_string();
            }
            map.insert(key.to_string(), val);
        } else {
            eprintln!(
                "Warning: ignoring .env line {} without '=': {}",
                idx + 1,
                line
            );
        }
    }
    map
}

/// Parse environment variables from a .env file in the current working directory, if present.
/// Returns a map of key/value pairs. Does not modify the process environment.
pub fn parse_env_file() -> Result<HashMap<String, String>> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(parse_env_lines(&content))
}

/// Load `.env` from current working directory into process environment (non-destructive: does not override existing vars).
pub fn load_dotenv_if_present() -> Result<()> {
    if let Ok(map) = parse_env_file() {
        for (k, v) in map {
            if std::env::var_os(&k).is_none() {
                unsafe {
                    std::env::set_var(&k, &v);
                }
            }
        }
    }
    Ok(())
}

/// Generate a .env.template file with placeholder values and comments.
pub fn write_env_template(path: &str) -> Result<()> {
    let mut f = fs::File::create(path)?;
    let template = r#"# attendance_matcher environment configuration template
# Copy this file to .env where you run the tool, or export the variables
# directly. Command-line flags override anything set here.

# Matching cutoffs (0.0..=1.0)
#ATTENDANCE_MATCHER_FUZZY_CUTOFF=0.72
#ATTENDANCE_MATCHER_TOKEN_CUTOFF=0.50

# Name columns (auto-detected from conventional headers when unset)
#ATTENDANCE_MATCHER_NAME_COLUMN=StudentName
#ATTENDANCE_MATCHER_PRESENT_NAME_COLUMN=StudentName

# Output
#ATTENDANCE_MATCHER_OUT=absentees.csv
# csv | json | both
#ATTENDANCE_MATCHER_FORMAT=csv

# Logging
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_blanks_and_quotes() {
        let content = "# comment\n\nA=1\nB=\"two words\"\nC='three'\nbroken line\n D = spaced \n";
        let map = parse_env_lines(content);
        assert_eq!(map.get("A").map(String::as_str), Some("1"));
        assert_eq!(map.get("B").map(String::as_str), Some("two words"));
        assert_eq!(map.get("C").map(String::as_str), Some("three"));
        assert_eq!(map.get("D").map(String::as_str), Some(" spaced"));
        assert!(!map.contains_key("broken line"));
    }

    #[test]
    fn template_round_trips_through_parser() {
        let path = std::env::temp_dir()
            .join(format!(
                "am_envtpl_{}.template",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap()
                    .as_nanos()
            ))
            .display()
            .to_string();
        write_env_template(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        // Everything in the template is commented out by default.
        assert!(parse_env_lines(&content).is_empty());
        assert!(content.contains("ATTENDANCE_MATCHER_FUZZY_CUTOFF"));
        std::fs::remove_file(&path).ok();
    }
}
