use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{BuildMineError, Result};

/// Marker on the line that opens travis-build's checkout section.
const CHECKOUT_START: &str = "start git.checkout";
/// Marker on the line that closes it.
const CHECKOUT_END: &str = "travis_fold end git.checkout";

/// Replaces the checkout section of a travis-build script with a `cd` into the
/// already checked-out repository, rewriting the file in place.
///
/// Everything from the line containing the start marker up to and including
/// the line containing the end marker is replaced by a single
/// `travis_cmd cd\ <repo> --assert --echo` line. Other lines are kept as-is.
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty `repo` or `path` (before touching the
/// file system) and `Io` if the script cannot be read or written.
pub fn rewrite_checkout(repo: &str, path: &Path) -> Result<()> {
    if repo.is_empty() {
        return Err(BuildMineError::InvalidArgument("repository slug is empty"));
    }
    if path.as_os_str().is_empty() {
        return Err(BuildMineError::InvalidArgument("build script path is empty"));
    }

    debug!("Modifying build script at {}.", path.display());

    let original = fs::read_to_string(path)?;
    let modified = strip_checkout(repo, &original);

    fs::remove_file(path)?;
    fs::write(path, modified)?;

    Ok(())
}

/// Pure text transformation behind [`rewrite_checkout`].
pub fn strip_checkout(repo: &str, script: &str) -> String {
    let mut output = String::with_capacity(script.len());
    let mut skip = false;

    for line in script.split_inclusive('\n') {
        if line.contains(CHECKOUT_START) {
            skip = true;
        } else if line.contains(CHECKOUT_END) {
            skip = false;
            output.push_str(&cd_command(repo));
        } else if !skip {
            output.push_str(line);
        }
    }

    output
}

fn cd_command(repo: &str) -> String {
    format!(r"travis_cmd cd\ {} --assert --echo", repo.replace(' ', r"\ ")) + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const SCRIPT: &str = "#!/bin/bash\n\
        travis_fold start system_info\n\
        echo system\n\
        travis_fold start git.checkout\n\
        travis_cmd git\\ clone\\ --depth\\=50\\ https://github.com/owner/repo.git\\ owner/repo --assert --echo\n\
        travis_cmd cd\\ owner/repo --assert --echo\n\
        travis_cmd git\\ checkout\\ -qf\\ abc123 --assert --echo\n\
        travis_fold end git.checkout\n\
        travis_cmd mvn\\ test --echo\n";

    #[test]
    fn test_replaces_checkout_region_with_single_cd() {
        let output = strip_checkout("owner/repo", SCRIPT);

        assert_eq!(
            output,
            "#!/bin/bash\n\
             travis_fold start system_info\n\
             echo system\n\
             travis_cmd cd\\ owner/repo --assert --echo\n\
             travis_cmd mvn\\ test --echo\n"
        );
    }

    #[test]
    fn test_escapes_spaces_in_repo() {
        let output = strip_checkout(
            "owner/my repo",
            "travis_fold start git.checkout\ntravis_fold end git.checkout\n",
        );
        assert_eq!(output, "travis_cmd cd\\ owner/my\\ repo --assert --echo\n");
    }

    #[test]
    fn test_script_without_checkout_is_unchanged() {
        let script = "echo one\necho two";
        assert_eq!(strip_checkout("owner/repo", script), script);
    }

    #[test]
    fn test_rewrites_file_in_place() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), SCRIPT).unwrap();

        rewrite_checkout("owner/repo", file.path()).unwrap();

        let rewritten = fs::read_to_string(file.path()).unwrap();
        assert!(!rewritten.contains("git.checkout"));
        assert_eq!(rewritten.matches("travis_cmd cd\\ owner/repo").count(), 1);
    }

    #[test]
    fn test_rejects_empty_arguments() {
        let file = NamedTempFile::new().unwrap();

        assert!(matches!(
            rewrite_checkout("", file.path()),
            Err(BuildMineError::InvalidArgument(_))
        ));
        assert!(matches!(
            rewrite_checkout("owner/repo", Path::new("")),
            Err(BuildMineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = rewrite_checkout("owner/repo", &dir.path().join("build.sh"));

        assert!(matches!(result, Err(BuildMineError::Io(_))));
    }
}
