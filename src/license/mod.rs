//! License lookup for dependencies checked out on disk.
//!
//! - [`LicenseDetector`]: the detection service: given a directory, ranked
//!   license candidates with per-file confidence.
//! - [`detector`]: the default, file-based [`LicenseDetector`].
//! - [`resolve_license`]: picks the winning candidate for a dependency, builds
//!   its license URL and collects copyright lines.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::models::{Dependency, License};

pub mod detector;

/// One license candidate reported by a [`LicenseDetector`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseMatch {
    /// Overall confidence in `0.0..=1.0`.
    pub confidence: f32,
    /// Confidence per file name, relative to the inspected directory.
    pub files: HashMap<String, f32>,
}

pub trait LicenseDetector: Send + Sync {
    /// Candidates keyed by license name, or an error when nothing usable was found.
    fn detect(&self, dir: &Path) -> Result<HashMap<String, LicenseMatch>>;
}

/// Set `dep.license` from the detector's best candidate.
///
/// Any detection error or empty result yields the "Unknown" license; this
/// never fails.
pub fn resolve_license(detector: &dyn LicenseDetector, dep: &mut Dependency) {
    let candidates = match detector.detect(&dep.local_path) {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!(dependency = %dep.name, "failed to detect license: {err:#}");
            dep.license = License::unknown();
            return;
        }
    };
    debug!(dependency = %dep.name, ?candidates, "got license candidates");

    let Some((name, file)) = select_license(&candidates) else {
        dep.license = License::unknown();
        return;
    };
    info!(dependency = %dep.name, license = %name, "got license");

    let (url, copyrights) = if file.is_empty() {
        (String::new(), Vec::new())
    } else {
        (
            license_url(&dep.vcs.source_file_template, &file),
            read_copyrights(&dep.local_path.join(&file)),
        )
    };

    dep.license = License {
        name,
        url,
        copyrights,
    };
}

/// Winning license name and its representative file.
///
/// Highest confidence wins; exact ties go to the lexicographically smallest
/// name. The representative file is the winner's highest-confidence file,
/// again smallest name on ties. Candidates at zero confidence never win.
pub fn select_license(candidates: &HashMap<String, LicenseMatch>) -> Option<(String, String)> {
    let (name, winner) = candidates
        .iter()
        .filter(|(_, m)| m.confidence > 0.0)
        .max_by(|(a_name, a), (b_name, b)| {
            a.confidence
                .total_cmp(&b.confidence)
                .then_with(|| b_name.cmp(a_name))
        })?;

    let file = winner
        .files
        .iter()
        .max_by(|(a_name, a), (b_name, b)| a.total_cmp(b).then_with(|| b_name.cmp(a_name)))
        .map(|(file, _)| file.clone())
        .unwrap_or_default();

    Some((name.clone(), file))
}

/// Substitute `file` into a source file template, dropping directory and
/// line placeholders.
pub fn license_url(template: &str, file: &str) -> String {
    if template.is_empty() {
        return String::new();
    }

    template
        .replace("#L{line}", "")
        .replace("#lines-{line}", "")
        .replace("{line}", "")
        .replace("{/dir}", "")
        .replace("{dir}", "")
        .replace("{/file}", &format!("/{file}"))
        .replace("{file}", file)
}

fn read_copyrights(path: &Path) -> Vec<String> {
    match std::fs::read(path) {
        Ok(bytes) => scan_copyrights(&String::from_utf8_lossy(&bytes)),
        Err(err) => {
            warn!(file = %path.display(), "failed to open license file for reading: {err}");
            Vec::new()
        }
    }
}

/// Lines that start with the word "copyright" (any case) and do not mention
/// a "notice".
pub fn scan_copyrights(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| is_copyright_line(line))
        .map(str::to_string)
        .collect()
}

fn is_copyright_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    let Some(rest) = lower.strip_prefix("copyright") else {
        return false;
    };
    let whole_word = rest.chars().next().map_or(true, |c| !c.is_alphanumeric());
    whole_word && !lower.contains("notice")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ecosystem, VcsData, UNKNOWN_LICENSE};
    use anyhow::bail;
    use std::fs;

    struct Fixed(HashMap<String, LicenseMatch>);

    impl LicenseDetector for Fixed {
        fn detect(&self, _dir: &Path) -> Result<HashMap<String, LicenseMatch>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl LicenseDetector for Failing {
        fn detect(&self, _dir: &Path) -> Result<HashMap<String, LicenseMatch>> {
            bail!("no license file was found")
        }
    }

    fn candidate(confidence: f32, files: &[(&str, f32)]) -> LicenseMatch {
        LicenseMatch {
            confidence,
            files: files.iter().map(|(f, c)| (f.to_string(), *c)).collect(),
        }
    }

    #[test]
    fn test_highest_confidence_wins() {
        for order in [["MIT", "Apache-2.0"], ["Apache-2.0", "MIT"]] {
            let mut candidates = HashMap::new();
            candidates.insert(order[0].to_string(), candidate(0.9, &[("LICENSE", 0.9)]));
            candidates.insert(order[1].to_string(), candidate(0.9, &[]));
            candidates.get_mut("MIT").unwrap().confidence = 0.95;

            let (name, _) = select_license(&candidates).unwrap();
            assert_eq!(name, "MIT");
        }
    }

    #[test]
    fn test_tie_breaks_by_name() {
        let mut candidates = HashMap::new();
        candidates.insert("MIT".to_string(), candidate(0.9, &[("LICENSE", 0.9)]));
        candidates.insert("BSD-2-Clause".to_string(), candidate(0.9, &[("COPYING", 0.9)]));
        candidates.insert("ISC".to_string(), candidate(0.9, &[("LICENSE", 0.9)]));

        assert_eq!(
            select_license(&candidates),
            Some(("BSD-2-Clause".to_string(), "COPYING".to_string()))
        );
    }

    #[test]
    fn test_representative_file() {
        let mut candidates = HashMap::new();
        candidates.insert(
            "MIT".to_string(),
            candidate(1.0, &[("README.md", 0.8), ("LICENSE.txt", 1.0), ("LICENSE", 1.0)]),
        );
        assert_eq!(
            select_license(&candidates),
            Some(("MIT".to_string(), "LICENSE".to_string()))
        );
    }

    #[test]
    fn test_zero_confidence_never_wins() {
        let mut candidates = HashMap::new();
        candidates.insert("MIT".to_string(), candidate(0.0, &[]));
        assert_eq!(select_license(&candidates), None);
        assert_eq!(select_license(&HashMap::new()), None);
    }

    #[test]
    fn test_license_url() {
        assert_eq!(
            license_url("https://github.com/org/repo/blob/master{/dir}/{file}#L{line}", "LICENSE"),
            "https://github.com/org/repo/blob/master/LICENSE"
        );
        assert_eq!(
            license_url("https://example.org/src{/dir}{/file}", "COPYING"),
            "https://example.org/src/COPYING"
        );
        assert_eq!(license_url("", "LICENSE"), "");
    }

    #[test]
    fn test_scan_copyrights() {
        let text = "\
MIT License

Copyright (c) 2015 Jane Doe
COPYRIGHT 2016 Example Corp.
copyrighted material is not a copyright line
   Copyright [yyyy] indented lines are skipped
The above copyright notice and this permission notice shall be included
Copyright notice: also skipped
";
        assert_eq!(
            scan_copyrights(text),
            vec![
                "Copyright (c) 2015 Jane Doe".to_string(),
                "COPYRIGHT 2016 Example Corp.".to_string(),
            ]
        );
    }

    fn dep_in(dir: &Path) -> Dependency {
        let mut dep = Dependency::new("github.com/org/repo", "v1.0.0", Ecosystem::Go, dir.to_path_buf());
        dep.vcs = VcsData {
            vcs: "git".to_string(),
            vcs_path: "https://github.com/org/repo.git".to_string(),
            branch: "master".to_string(),
            ..VcsData::default()
        };
        dep.vcs.format_source_paths();
        dep
    }

    #[test]
    fn test_resolve_license() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("LICENSE"),
            "The MIT License\n\nCopyright (c) 2020 Org\n",
        )
        .unwrap();

        let mut candidates = HashMap::new();
        candidates.insert("MIT".to_string(), candidate(0.98, &[("LICENSE", 0.98)]));
        candidates.insert("ISC".to_string(), candidate(0.8, &[("LICENSE", 0.8)]));

        let mut dep = dep_in(dir.path());
        resolve_license(&Fixed(candidates), &mut dep);

        assert_eq!(dep.license.name, "MIT");
        assert_eq!(dep.license.url, "https://github.com/org/repo/blob/master/LICENSE");
        assert_eq!(dep.license.copyrights, vec!["Copyright (c) 2020 Org".to_string()]);
    }

    #[test]
    fn test_resolve_license_without_file_has_no_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut candidates = HashMap::new();
        candidates.insert("Apache-2.0".to_string(), candidate(0.9, &[]));

        let mut dep = dep_in(dir.path());
        resolve_license(&Fixed(candidates), &mut dep);

        assert_eq!(dep.license.name, "Apache-2.0");
        assert!(dep.license.url.is_empty());
        assert!(dep.license.copyrights.is_empty());
    }

    #[test]
    fn test_resolve_license_failures_are_unknown() {
        let dir = tempfile::tempdir().unwrap();

        let mut dep = dep_in(dir.path());
        resolve_license(&Failing, &mut dep);
        assert_eq!(dep.license.name, UNKNOWN_LICENSE);

        let mut dep = dep_in(dir.path());
        resolve_license(&Fixed(HashMap::new()), &mut dep);
        assert_eq!(dep.license.name, UNKNOWN_LICENSE);
        assert!(dep.license.url.is_empty());
    }
}
