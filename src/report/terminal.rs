use std::collections::HashMap;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{Dependency, UNKNOWN_LICENSE};

/// Render the dependency list as a colored terminal table.
pub fn render(deps: &[Dependency]) {
    println!("\n {} v{}\n", "depsleuth".bold(), env!("CARGO_PKG_VERSION"));

    if !deps.is_empty() {
        println!("{}", build_table(deps));
    }

    let unknown = deps.iter().filter(|d| is_unknown(d)).count();
    let unresolved = deps.iter().filter(|d| d.vcs.vcs_path.is_empty()).count();
    println!(
        " Total: {}  Known license: {}  Unknown license: {}  No repository: {}",
        deps.len(),
        (deps.len() - unknown).to_string().green(),
        unknown.to_string().yellow(),
        unresolved.to_string().red(),
    );

    let summary = summarize_licenses(deps);
    if !summary.is_empty() {
        println!(" Licenses: {summary}");
    }
}

fn build_table(deps: &[Dependency]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Module").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Repository").add_attribute(Attribute::Bold),
            Cell::new("Project").add_attribute(Attribute::Bold),
        ]);

    for dep in deps {
        let license_color = if is_unknown(dep) {
            Color::Yellow
        } else {
            Color::Green
        };

        table.add_row(vec![
            Cell::new(&dep.name),
            Cell::new(&dep.version),
            Cell::new(license_name(dep)).fg(license_color),
            Cell::new(&dep.vcs.vcs_path),
            Cell::new(&dep.parent),
        ]);
    }

    table
}

fn license_name(dep: &Dependency) -> &str {
    if dep.license.name.is_empty() {
        UNKNOWN_LICENSE
    } else {
        &dep.license.name
    }
}

fn is_unknown(dep: &Dependency) -> bool {
    license_name(dep) == UNKNOWN_LICENSE
}

/// The most common licenses, e.g. `MIT (12), Apache-2.0 (4), BSD-3-Clause (2)`.
fn summarize_licenses(deps: &[Dependency]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for dep in deps {
        *counts.entry(license_name(dep)).or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    pairs
        .iter()
        .take(5)
        .map(|(lic, cnt)| format!("{lic} ({cnt})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ecosystem, License};
    use std::path::PathBuf;

    fn dep(name: &str, license: &str) -> Dependency {
        let mut dep = Dependency::new(name, "v1.0.0", Ecosystem::Go, PathBuf::new());
        dep.license = License {
            name: license.to_string(),
            ..License::default()
        };
        dep
    }

    #[test]
    fn test_summarize_licenses() {
        let deps = vec![
            dep("a", "MIT"),
            dep("b", "Apache-2.0"),
            dep("c", "MIT"),
            dep("d", ""),
        ];
        assert_eq!(
            summarize_licenses(&deps),
            "MIT (2), Apache-2.0 (1), Unknown (1)"
        );
    }

    #[test]
    fn test_table_has_one_row_per_dependency() {
        let deps = vec![dep("a", "MIT"), dep("b", "Unknown")];
        let rendered = build_table(&deps).to_string();
        assert!(rendered.contains("Module"));
        assert!(rendered.contains("MIT"));
        assert_eq!(build_table(&deps).row_iter().count(), 2);
    }
}
