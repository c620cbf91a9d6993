use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use log::{debug, error};
use regex::Regex;

use crate::error::{BuildMineError, Result};

/// Inserted when the first ` -` follows an escaped space (or starts the line).
const FLAG_AFTER_ESCAPE: &str = r" -Dhttps.protocols=TLSv1.2\ -";
/// Inserted when the first ` -` follows a plain argument character.
const FLAG_ESCAPED: &str = r"\ -Dhttps.protocols=TLSv1.2 -";

/// What to do with a Maven line that has no ` -` to anchor the flag on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnflaggedMavenLine {
    /// Keep the line unchanged.
    #[default]
    PassThrough,
    /// Remove the line, matching scripts patched by earlier tooling.
    Drop,
}

/// Matches `mvn` as a command, but not the `mvnw` wrapper.
fn maven_invocation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"mvn(?:[^w]|$)").expect("valid regex"))
}

/// Forces TLS 1.2 for every Maven invocation of a build script, rewriting the
/// file in place. Needed for Java jobs on JDK 7, whose default protocols are
/// refused by Maven Central.
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty path, `NotAFile` if `path` is not a
/// regular file, and `Io` if reading or writing fails.
pub fn patch_maven_tls(path: &Path, unflagged: UnflaggedMavenLine) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(BuildMineError::InvalidArgument("build script path is empty"));
    }
    if !path.is_file() {
        let err = BuildMineError::NotAFile(path.to_path_buf());
        error!("{err}");
        return Err(err);
    }

    let original = fs::read_to_string(path).inspect_err(|_| {
        error!(
            "Error reading {} for patching mvn commands to use TLSv1.2.",
            path.display()
        );
    })?;

    let patched = add_tls_flag(&original, unflagged);
    debug!("Patched mvn commands in {}.", path.display());

    fs::write(path, patched).inspect_err(|_| {
        error!(
            "Error writing {} for patching mvn commands to use TLSv1.2.",
            path.display()
        );
    })?;

    Ok(())
}

/// Pure text transformation behind [`patch_maven_tls`].
pub fn add_tls_flag(script: &str, unflagged: UnflaggedMavenLine) -> String {
    let mut output = String::with_capacity(script.len());

    for line in script.split_inclusive('\n') {
        if !maven_invocation().is_match(line) {
            output.push_str(line);
            continue;
        }

        match patch_line(line) {
            Some(patched) => output.push_str(&patched),
            None if unflagged == UnflaggedMavenLine::PassThrough => output.push_str(line),
            None => debug!("Dropping mvn line without flags: {}", line.trim_end()),
        }
    }

    output
}

/// Inserts the TLS flag before the first ` -` of `line`, keeping the script's
/// backslash-escaped-space argument style. `None` if the line has no ` -`.
fn patch_line(line: &str) -> Option<String> {
    let idx = line.find(" -")?;
    let after_escape = idx == 0 || line[..idx].ends_with('\\');
    let insert = if after_escape {
        FLAG_AFTER_ESCAPE
    } else {
        FLAG_ESCAPED
    };

    Some(format!("{}{}{}", &line[..idx], insert, &line[idx + 2..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_inserts_escaped_flag_after_plain_argument() {
        let output = add_tls_flag(
            "travis_cmd mvn\\ clean\\ test --echo\n",
            UnflaggedMavenLine::PassThrough,
        );
        assert_eq!(
            output,
            "travis_cmd mvn\\ clean\\ test\\ -Dhttps.protocols=TLSv1.2 --echo\n"
        );
    }

    #[test]
    fn test_inserts_flag_after_escaped_space() {
        let output = add_tls_flag(
            "travis_cmd mvn\\ clean\\ cobertura:cobertura\\ coveralls:report\\ --echo --timing\n",
            UnflaggedMavenLine::PassThrough,
        );
        assert_eq!(
            output,
            "travis_cmd mvn\\ clean\\ cobertura:cobertura\\ coveralls:report\\ -Dhttps.protocols=TLSv1.2\\ --echo --timing\n"
        );
    }

    #[test]
    fn test_only_first_flag_is_patched() {
        let output = add_tls_flag(
            "travis_cmd mvn\\ install -DskipTests --echo --timing\n",
            UnflaggedMavenLine::PassThrough,
        );
        assert_eq!(output.matches("TLSv1.2").count(), 1);
        assert!(output.ends_with("-DskipTests --echo --timing\n"));
    }

    #[test]
    fn test_maven_wrapper_is_untouched() {
        let line = "travis_cmd ./mvnw\\ test --echo\n";
        assert_eq!(add_tls_flag(line, UnflaggedMavenLine::Drop), line);
    }

    #[test]
    fn test_non_maven_lines_are_untouched() {
        let script = "#!/bin/bash\ntravis_cmd gradle\\ test --echo\necho done";
        assert_eq!(add_tls_flag(script, UnflaggedMavenLine::Drop), script);
    }

    #[test]
    fn test_unflagged_line_passes_through_by_default() {
        let script = "echo start\nmvn package\necho end\n";
        assert_eq!(add_tls_flag(script, UnflaggedMavenLine::default()), script);
    }

    #[test]
    fn test_unflagged_line_dropped_when_requested() {
        let script = "echo start\nmvn package\necho end\n";
        assert_eq!(
            add_tls_flag(script, UnflaggedMavenLine::Drop),
            "echo start\necho end\n"
        );
    }

    #[test]
    fn test_patches_file_in_place() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            "travis_cmd java\\ -version --echo\ntravis_cmd mvn\\ test --echo\n",
        )
        .unwrap();

        patch_maven_tls(file.path(), UnflaggedMavenLine::PassThrough).unwrap();

        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "travis_cmd java\\ -version --echo\ntravis_cmd mvn\\ test\\ -Dhttps.protocols=TLSv1.2 --echo\n"
        );
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = patch_maven_tls(dir.path(), UnflaggedMavenLine::PassThrough).unwrap_err();

        assert!(matches!(err, BuildMineError::NotAFile(_)));
        assert!(err.to_string().ends_with("is not a file."));
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let err = patch_maven_tls(Path::new(""), UnflaggedMavenLine::PassThrough).unwrap_err();
        assert!(matches!(err, BuildMineError::InvalidArgument(_)));
    }
}
