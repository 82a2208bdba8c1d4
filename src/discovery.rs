//! Scanner for `?go-get=1` discovery documents.
//!
//! Module hosts answer discovery requests with an HTML page carrying
//! `go-import` and `go-source` meta tags in its `<head>`. Real pages are rarely
//! well-formed XML, so the document is read as a loose markup stream and
//! scanning stops at the first `<body>` or `</head>`, or at the first token
//! the reader cannot make sense of.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::models::VcsData;

/// Fill `vcs` with the coordinates declared in `document`.
///
/// Never fails. Tags with an unexpected number of fields are ignored, and a
/// document without usable tags leaves `vcs` as it was.
pub fn parse_discovery_document(document: &[u8], vcs: &mut VcsData) {
    let mut reader = Reader::from_reader(document);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.trim_text(true);
    }

    let mut buf = Vec::new();
    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(err) => {
                debug!(
                    position = reader.buffer_position(),
                    "stopped scanning discovery document: {err}"
                );
                break;
            }
        };

        match event {
            Event::Eof => break,
            Event::Start(ref e) | Event::Empty(ref e) if is_tag(e.local_name().as_ref(), b"body") => {
                break
            }
            Event::End(ref e) if is_tag(e.local_name().as_ref(), b"head") => break,
            Event::Start(ref e) | Event::Empty(ref e) if is_tag(e.local_name().as_ref(), b"meta") => {
                apply_meta(e, vcs);
            }
            _ => {}
        }
        buf.clear();
    }
}

fn is_tag(name: &[u8], expected: &[u8]) -> bool {
    name.eq_ignore_ascii_case(expected)
}

fn apply_meta(tag: &BytesStart<'_>, vcs: &mut VcsData) {
    let mut name: Option<String> = None;
    let mut content: Option<String> = None;

    for attr in tag.html_attributes().flatten() {
        let key = attr.key.local_name();
        let slot = if key.as_ref().eq_ignore_ascii_case(b"name") {
            &mut name
        } else if key.as_ref().eq_ignore_ascii_case(b"content") {
            &mut content
        } else {
            continue;
        };
        if slot.is_some() {
            continue;
        }
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        *slot = Some(value);
    }

    let Some(name) = name else {
        return;
    };
    let content = content.unwrap_or_default();
    let fields: Vec<&str> = content.split_whitespace().collect();

    match (name.as_str(), fields.as_slice()) {
        ("go-import", [_root, kind, repo]) => {
            vcs.vcs = kind.to_string();
            vcs.vcs_path = repo.to_string();
        }
        ("go-source", [_root, _home, dir, file]) => {
            vcs.source_dir_template = dir.to_string();
            vcs.source_file_template = file.to_string();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(document: &str) -> VcsData {
        let mut vcs = VcsData::default();
        parse_discovery_document(document.as_bytes(), &mut vcs);
        vcs
    }

    #[test]
    fn test_go_import_and_go_source() {
        let vcs = parse(
            r#"<head><meta name="go-import" content="example.org/m git https://example.org/m.git"><meta name="go-source" content="example.org/m _ https://example.org/m/blob/master{/dir} https://example.org/m/blob/master{/dir}/{file}"></head><body>"#,
        );
        assert_eq!(vcs.vcs, "git");
        assert_eq!(vcs.vcs_path, "https://example.org/m.git");
        assert_eq!(vcs.source_dir_template, "https://example.org/m/blob/master{/dir}");
        assert_eq!(
            vcs.source_file_template,
            "https://example.org/m/blob/master{/dir}/{file}"
        );
    }

    #[test]
    fn test_real_world_page() {
        let vcs = parse(
            r#"<!DOCTYPE html>
<html lang=en>
<HEAD>
  <meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
  <META NAME="go-import" CONTENT="golang.org/x/text git https://go.googlesource.com/text">
  <meta name="go-source" content="golang.org/x/text https://github.com/golang/text/ https://github.com/golang/text/tree/master{/dir} https://github.com/golang/text/blob/master{/dir}/{file}#L{line}">
  <meta http-equiv="refresh" content="0; url=https://pkg.go.dev/golang.org/x/text">
</HEAD>
<body>
Nothing to see here; <a href="https://pkg.go.dev/golang.org/x/text">see the package on pkg.go.dev</a>.
</body>
</html>"#,
        );
        assert_eq!(vcs.vcs, "git");
        assert_eq!(vcs.vcs_path, "https://go.googlesource.com/text");
        assert_eq!(
            vcs.source_file_template,
            "https://github.com/golang/text/blob/master{/dir}/{file}#L{line}"
        );
    }

    #[test]
    fn test_malformed_go_import_is_ignored() {
        let vcs = parse(r#"<head><meta name="go-import" content="example.org/m git"></head>"#);
        assert_eq!(vcs, VcsData::default());
    }

    #[test]
    fn test_malformed_go_source_is_ignored() {
        let vcs = parse(
            r#"<head><meta name="go-source" content="example.org/m _ https://example.org/m{/dir}"></head>"#,
        );
        assert_eq!(vcs, VcsData::default());
    }

    #[test]
    fn test_tags_after_head_are_ignored() {
        let vcs = parse(
            r#"<html><head><title>m</title></head><meta name="go-import" content="example.org/m git https://example.org/m.git"></html>"#,
        );
        assert_eq!(vcs, VcsData::default());
    }

    #[test]
    fn test_tags_in_body_are_ignored() {
        let vcs = parse(
            r#"<html><body><meta name="go-import" content="example.org/m git https://example.org/m.git"></body></html>"#,
        );
        assert_eq!(vcs, VcsData::default());
    }

    #[test]
    fn test_garbage_does_not_panic() {
        let mut vcs = VcsData::default();
        parse_discovery_document(b"\xff\xfe<<<>>> not html at all </", &mut vcs);
        parse_discovery_document(b"", &mut vcs);
        assert_eq!(vcs, VcsData::default());
    }
}
