use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::debug;

use super::{LicenseDetector, LicenseMatch};

/// File names (lowercased prefixes) inspected for license text.
const LICENSE_FILE_PREFIXES: &[&str] = &["license", "licence", "copying", "unlicense"];

/// Minimum share of a signature's phrases a file must contain.
const MIN_CONFIDENCE: f32 = 0.75;

/// Key phrases of a license text, lowercased with collapsed whitespace.
struct Signature {
    name: &'static str,
    phrases: &'static [&'static str],
    /// Any of these disqualifies the license.
    excludes: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        name: "MIT",
        phrases: &[
            "permission is hereby granted, free of charge, to any person obtaining a copy",
            "the above copyright notice and this permission notice shall be included",
            "the software is provided \"as is\", without warranty of any kind",
        ],
        excludes: &[],
    },
    Signature {
        name: "ISC",
        phrases: &[
            "permission to use, copy, modify, and",
            "distribute this software for any purpose with or without fee is hereby granted",
            "the software is provided \"as is\" and the author disclaims all warranties",
        ],
        excludes: &[],
    },
    Signature {
        name: "Apache-2.0",
        phrases: &[
            "apache license",
            "version 2.0, january 2004",
            "terms and conditions for use, reproduction, and distribution",
        ],
        excludes: &[],
    },
    Signature {
        name: "BSD-3-Clause",
        phrases: &[
            "redistribution and use in source and binary forms, with or without modification, are permitted provided that the following conditions are met",
            "redistributions of source code must retain the above copyright notice",
            "redistributions in binary form must reproduce the above copyright notice",
            "neither the name of",
        ],
        excludes: &["all advertising materials mentioning features"],
    },
    Signature {
        name: "BSD-2-Clause",
        phrases: &[
            "redistribution and use in source and binary forms, with or without modification, are permitted provided that the following conditions are met",
            "redistributions of source code must retain the above copyright notice",
            "redistributions in binary form must reproduce the above copyright notice",
        ],
        excludes: &[
            "neither the name of",
            "all advertising materials mentioning features",
        ],
    },
    Signature {
        name: "GPL-2.0",
        phrases: &[
            "gnu general public license",
            "version 2, june 1991",
            "the licenses for most software are designed to take away your freedom to share and change it",
        ],
        excludes: &[],
    },
    Signature {
        name: "GPL-3.0",
        phrases: &[
            "gnu general public license",
            "version 3, 29 june 2007",
            "the gnu general public license is a free, copyleft license for software and other kinds of works",
        ],
        excludes: &[],
    },
    Signature {
        name: "LGPL-2.1",
        phrases: &[
            "gnu lesser general public license",
            "version 2.1, february 1999",
        ],
        excludes: &[],
    },
    Signature {
        name: "LGPL-3.0",
        phrases: &[
            "gnu lesser general public license",
            "version 3, 29 june 2007",
            "this version of the gnu lesser general public license incorporates the terms and conditions of version 3 of the gnu general public license",
        ],
        excludes: &[],
    },
    Signature {
        name: "AGPL-3.0",
        phrases: &[
            "gnu affero general public license",
            "version 3, 19 november 2007",
        ],
        excludes: &[],
    },
    Signature {
        name: "MPL-2.0",
        phrases: &[
            "mozilla public license version 2.0",
            "\"covered software\" means",
            "this source code form is subject to the terms of the mozilla public license, v. 2.0",
        ],
        excludes: &[],
    },
    Signature {
        name: "Unlicense",
        phrases: &[
            "this is free and unencumbered software released into the public domain",
            "anyone is free to copy, modify, publish, use, compile, sell, or distribute this software",
        ],
        excludes: &[],
    },
];

/// Detects licenses from the license files at the top of a directory.
#[derive(Debug, Default)]
pub struct FileLicenseDetector;

impl FileLicenseDetector {
    pub fn new() -> Self {
        Self
    }
}

impl LicenseDetector for FileLicenseDetector {
    fn detect(&self, dir: &Path) -> Result<HashMap<String, LicenseMatch>> {
        let files = license_files(dir)?;
        if files.is_empty() {
            bail!("no license file was found in {}", dir.display());
        }

        let mut results: HashMap<String, LicenseMatch> = HashMap::new();
        for (file_name, path) in files {
            let text = match std::fs::read(&path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) => {
                    debug!(file = %path.display(), "skipping unreadable license file: {err}");
                    continue;
                }
            };

            for (license, confidence) in score_text(&text) {
                let entry = results.entry(license).or_default();
                entry.confidence = entry.confidence.max(confidence);
                entry.files.insert(file_name.clone(), confidence);
            }
        }

        if results.is_empty() {
            bail!("no license was detected in {}", dir.display());
        }
        Ok(results)
    }
}

/// Candidate license files in `dir`, sorted by name.
fn license_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut files: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let lower = name.to_lowercase();
            LICENSE_FILE_PREFIXES
                .iter()
                .any(|prefix| lower.starts_with(prefix))
                .then(|| (name, entry.path()))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Licenses whose signatures match `text`, with their confidence.
///
/// An `SPDX-License-Identifier` line is taken at face value.
pub fn score_text(text: &str) -> Vec<(String, f32)> {
    if let Some(id) = spdx_identifier(text) {
        return vec![(id, 1.0)];
    }

    let normalized = normalize_text(text);
    SIGNATURES
        .iter()
        .filter(|sig| !sig.excludes.iter().any(|e| normalized.contains(e)))
        .filter_map(|sig| {
            let matched = sig
                .phrases
                .iter()
                .filter(|phrase| normalized.contains(*phrase))
                .count();
            let confidence = matched as f32 / sig.phrases.len() as f32;
            (confidence >= MIN_CONFIDENCE).then(|| (sig.name.to_string(), confidence))
        })
        .collect()
}

fn spdx_identifier(text: &str) -> Option<String> {
    let re = Regex::new(r"(?m)SPDX-License-Identifier:\s*(.+?)\s*(?:\*/)?\s*$").ok()?;
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|id| !id.is_empty())
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MIT: &str = r#"MIT License

Copyright (c) 2018 Example Authors

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY.
"#;

    const BSD3: &str = r#"Copyright (c) 2009 The Go Authors. All rights reserved.

Redistribution and use in source and binary forms, with or without
modification, are permitted provided that the following conditions are
met:

   * Redistributions of source code must retain the above copyright
notice, this list of conditions and the following disclaimer.
   * Redistributions in binary form must reproduce the above
copyright notice, this list of conditions and the following disclaimer
in the documentation and/or other materials provided with the
distribution.
   * Neither the name of Google Inc. nor the names of its
contributors may be used to endorse or promote products derived from
this software without specific prior written permission.
"#;

    #[test]
    fn test_score_mit() {
        assert_eq!(score_text(MIT), vec![("MIT".to_string(), 1.0)]);
    }

    #[test]
    fn test_bsd3_is_not_bsd2() {
        assert_eq!(score_text(BSD3), vec![("BSD-3-Clause".to_string(), 1.0)]);
    }

    #[test]
    fn test_spdx_identifier() {
        assert_eq!(
            score_text("// SPDX-License-Identifier: Apache-2.0 OR MIT\n"),
            vec![("Apache-2.0 OR MIT".to_string(), 1.0)]
        );
        assert_eq!(
            score_text("/* SPDX-License-Identifier: ISC */\n"),
            vec![("ISC".to_string(), 1.0)]
        );
    }

    #[test]
    fn test_unrelated_text_scores_nothing() {
        assert!(score_text("All rights reserved. Do not copy.").is_empty());
    }

    #[test]
    fn test_detect_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("LICENSE"), MIT).unwrap();
        fs::write(dir.path().join("README.md"), BSD3).unwrap();
        fs::create_dir(dir.path().join("licenses")).unwrap();

        let results = FileLicenseDetector::new().detect(dir.path()).unwrap();

        assert_eq!(results.len(), 1);
        let mit = &results["MIT"];
        assert_eq!(mit.confidence, 1.0);
        assert_eq!(mit.files.get("LICENSE"), Some(&1.0));
    }

    #[test]
    fn test_detect_errors() {
        let dir = tempfile::tempdir().unwrap();
        let detector = FileLicenseDetector::new();

        assert!(detector.detect(&dir.path().join("missing")).is_err());
        assert!(detector.detect(dir.path()).is_err());

        fs::write(dir.path().join("LICENSE"), "Proprietary, all rights reserved.").unwrap();
        assert!(detector.detect(dir.path()).is_err());
    }
}
