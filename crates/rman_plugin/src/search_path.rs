//! Plugin search paths.
//!
//! A search path is written as a list of directories separated by `:` or `;`
//! (only `;` on Windows). Inside an entry `$VAR` and `${VAR}` are replaced
//! from the environment. Two entries are special: `&` stands for the previous
//! path and `@` for the default path (the current directory followed by the
//! directory of the running program).

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

const SEPARATORS: &[char] = if cfg!(windows) { &[';'] } else { &[':', ';'] };

/// Ordered list of directories searched for plugin libraries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    /// The current directory followed by the program directory.
    #[must_use]
    pub fn default_path() -> Self {
        let mut entries = vec![PathBuf::from(".")];
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            entries.push(dir);
        }
        Self { entries }
    }

    #[must_use]
    pub fn from_entries(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    /// Parses `spec`, expanding variables from the process environment.
    #[must_use]
    pub fn parse(spec: &str, previous: &SearchPath) -> Self {
        Self::parse_with(spec, previous, |name| std::env::var(name).ok())
    }

    /// Parses `spec`, expanding variables with `lookup`. Unknown variables
    /// expand to nothing.
    pub fn parse_with<F>(spec: &str, previous: &SearchPath, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut entries = Vec::new();
        for raw in spec.split(SEPARATORS) {
            let raw = raw.trim();
            match raw {
                "" => {}
                "&" => entries.extend(previous.entries.iter().cloned()),
                "@" => entries.extend(Self::default_path().entries),
                _ => {
                    let expanded = expand_vars(raw, &lookup);
                    if !expanded.is_empty() {
                        entries.push(PathBuf::from(expanded));
                    }
                }
            }
        }
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// First existing `dir/file_name` over all entries.
    pub fn find(&self, file_name: impl AsRef<OsStr>) -> Option<PathBuf> {
        let file_name = file_name.as_ref();
        self.entries
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.is_file())
    }

    /// Locates the shared library for plugin `name`, e.g. `libname.so`.
    #[must_use]
    pub fn find_library(&self, name: &str) -> Option<PathBuf> {
        self.find(libloading::library_filename(name))
    }
}

impl Default for SearchPath {
    fn default() -> Self {
        Self::default_path()
    }
}

impl fmt::Display for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(if cfg!(windows) { ";" } else { ":" })?;
            }
            write!(f, "{}", entry.display())?;
        }
        Ok(())
    }
}

fn expand_vars<F>(input: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let mut name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                name.push(c);
                chars.next();
            }
        }
        if name.is_empty() {
            out.push('$');
        } else if let Some(value) = lookup(&name) {
            out.push_str(&value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "HOME" => Some("/home/ri".into()),
            "PLUGINS" => Some("/opt/rman".into()),
            _ => None,
        }
    }

    #[test]
    fn variables_are_expanded() {
        let path = SearchPath::parse_with(
            "$HOME/lib;${PLUGINS}/display;$MISSING/x",
            &SearchPath::from_entries(Vec::new()),
            env,
        );
        assert_eq!(
            path.entries(),
            [
                PathBuf::from("/home/ri/lib"),
                PathBuf::from("/opt/rman/display"),
                PathBuf::from("/x"),
            ]
        );
    }

    #[test]
    fn ampersand_inserts_previous_path() {
        let previous = SearchPath::from_entries(vec![PathBuf::from("/old")]);
        let path = SearchPath::parse_with("/new;&", &previous, env);
        assert_eq!(path.entries(), [PathBuf::from("/new"), PathBuf::from("/old")]);
    }

    #[test]
    fn at_inserts_default_path() {
        let path = SearchPath::parse_with("@", &SearchPath::from_entries(Vec::new()), env);
        assert_eq!(path.entries().first(), Some(&PathBuf::from(".")));
    }

    #[test]
    fn lone_dollar_is_kept() {
        assert_eq!(expand_vars("a$/b", &env), "a$/b");
    }
}
