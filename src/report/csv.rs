use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::Dependency;

const HEADERS: [&str; 6] = [
    "Module",
    "License",
    "Repository URL",
    "License URL",
    "Project",
    "Copyrights",
];

const DELIMITER: char = ';';

/// Write `deps` to `out_file`, replacing any existing file.
pub fn write(deps: &[Dependency], out_file: &Path) -> Result<()> {
    info!(dependencies = deps.len(), file = %out_file.display(), "writing CSV report");

    let file = File::create(out_file)
        .with_context(|| format!("failed to open '{}' for writing", out_file.display()))?;
    let mut writer = BufWriter::new(file);
    write_to(&mut writer, deps)?;
    writer.flush()?;
    Ok(())
}

fn write_to<W: Write>(writer: &mut W, deps: &[Dependency]) -> Result<()> {
    write_record(writer, &HEADERS)?;

    for dep in deps {
        let copyrights = dep.license.copyrights.join("\n");
        write_record(
            writer,
            &[
                dep.name.as_str(),
                dep.license.name.as_str(),
                dep.vcs.vcs_path.as_str(),
                dep.license.url.as_str(),
                dep.parent.as_str(),
                copyrights.as_str(),
            ],
        )?;
    }

    Ok(())
}

fn write_record<W: Write>(writer: &mut W, fields: &[&str]) -> Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string());
    writeln!(writer, "{line}")?;
    Ok(())
}

/// Quote a field when it contains the delimiter, a quote or a line break.
fn escape_field(field: &str) -> String {
    let needs_quotes = field.contains(DELIMITER)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
        || field.starts_with(' ');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ecosystem, License};
    use std::path::PathBuf;

    fn dep() -> Dependency {
        let mut dep = Dependency::new("github.com/pkg/errors", "v0.9.1", Ecosystem::Go, PathBuf::new());
        dep.parent = "example.org/app".to_string();
        dep.vcs.vcs_path = "https://github.com/pkg/errors".to_string();
        dep.license = License {
            name: "BSD-2-Clause".to_string(),
            url: "https://github.com/pkg/errors/blob/master/LICENSE".to_string(),
            copyrights: vec![
                "Copyright (c) 2015, Dave Cheney <dave@cheney.net>".to_string(),
                "Copyright \"Someone\"; 2016".to_string(),
            ],
        };
        dep
    }

    #[test]
    fn test_csv_rows() {
        let mut out = Vec::new();
        write_to(&mut out, &[dep()]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "Module;License;Repository URL;License URL;Project;Copyrights\n\
             github.com/pkg/errors;BSD-2-Clause;https://github.com/pkg/errors;\
             https://github.com/pkg/errors/blob/master/LICENSE;example.org/app;\
             \"Copyright (c) 2015, Dave Cheney <dave@cheney.net>\n\
             Copyright \"\"Someone\"\"; 2016\"\n"
        );
    }

    #[test]
    fn test_write_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale content that is much longer than the report\n".repeat(50)).unwrap();

        write(&[], &path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Module;License;Repository URL;License URL;Project;Copyrights\n"
        );
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a;b"), "\"a;b\"");
        assert_eq!(escape_field(""), "");
    }
}
