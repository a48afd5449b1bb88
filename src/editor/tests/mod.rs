use super::*;
use crate::Nzb;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DOCTYPE: &str =
    r#"nzb PUBLIC "-//newzBin//DTD NZB 1.1//EN" "http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd""#;

const FILE_ELEMENT: &str = r#"<file poster="John &lt;nzb@nowhere.example&gt;" date="1706440708" subject="[1/1] - &quot;Big Buck Bunny - S01E01.mkv&quot; yEnc (1/2) 1478616">
        <groups>
            <group>alt.binaries.boneless</group>
        </groups>
        <segments>
            <segment bytes="739067" number="1">9cacde4c986547369becbf97003fb2c5-9483514693959@example</segment>
            <segment bytes="739549" number="2">70a3a038ce324e618e2751e063d6a036-7285710986748@example</segment>
        </segments>
    </file>"#;

fn document(head: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE {DOCTYPE}>
<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
    {head}
    {FILE_ELEMENT}
</nzb>"#
    )
}

fn full_head() -> String {
    document(
        r#"<head>
        <meta type="title">Big Buck Bunny - S01E01.mkv</meta>
        <meta type="password">secret</meta>
        <meta type="tag">HD</meta>
        <meta type="category">TV</meta>
    </head>"#,
    )
}

fn entries(editor: &NzbMetaEditor) -> Vec<(String, String)> {
    editor.meta_entries()
}

fn pair(kind: &str, value: &str) -> (String, String) {
    (kind.to_string(), value.to_string())
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn test_new_rejects_malformed_xml() {
    let err = NzbMetaEditor::new("<nzb><head></nzb>").unwrap_err();
    assert_eq!(err.code(), "malformed_xml");
}

#[test]
fn test_new_does_not_validate_nzb_structure() {
    let editor = NzbMetaEditor::new("<nzb/>").unwrap();
    assert!(editor.meta_entries().is_empty());
    assert!(editor.doctype().is_none());
    assert!(editor.declaration().is_none());
}

#[test]
fn test_new_tolerates_surrounding_whitespace() {
    let text = format!("\n\n{}\n", full_head());
    assert!(NzbMetaEditor::new(&text).is_ok());
}

#[test]
fn test_doctype_and_declaration_are_kept() {
    let editor = NzbMetaEditor::new(&full_head()).unwrap();
    assert_eq!(editor.doctype(), Some(DOCTYPE));
    assert_eq!(editor.declaration().unwrap().encoding.as_deref(), Some("UTF-8"));

    let output = editor.to_str().unwrap();
    let mut lines = output.lines();
    assert_eq!(
        lines.next(),
        Some(r#"<?xml version="1.0" encoding="utf-8"?>"#)
    );
    assert_eq!(lines.next(), Some(format!("<!DOCTYPE {DOCTYPE}>").as_str()));
    assert_eq!(
        lines.next(),
        Some(r#"<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">"#)
    );
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

#[test]
fn test_set_title_replaces_existing() {
    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    editor.set(MetaUpdate::new().title("T"));

    let output = editor.to_str().unwrap();
    assert_eq!(output.matches(r#"<meta type="title">"#).count(), 1);
    assert!(output.contains(r#"<meta type="title">T</meta>"#));
    assert_eq!(
        entries(&editor),
        vec![
            pair("title", "T"),
            pair("category", "TV"),
            pair("password", "secret"),
            pair("tag", "HD"),
        ]
    );
}

#[test]
fn test_set_empty_update_is_noop() {
    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    let before = editor.to_str().unwrap();
    editor.set(MetaUpdate::new());
    assert_eq!(editor.to_str().unwrap(), before);
}

#[test]
fn test_set_all_fields() {
    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    editor.set(
        MetaUpdate::new()
            .title("New Title")
            .passwords(["one", "two"])
            .tags(["1080p"])
            .category("Movies"),
    );

    assert_eq!(
        entries(&editor),
        vec![
            pair("title", "New Title"),
            pair("category", "Movies"),
            pair("password", "one"),
            pair("password", "two"),
            pair("tag", "1080p"),
        ]
    );
}

#[test]
fn test_set_matches_types_case_insensitively() {
    let text = document(
        r#"<head>
        <meta type="PASSWORD">old</meta>
        <meta type="Tag">keep</meta>
    </head>"#,
    );
    let mut editor = NzbMetaEditor::new(&text).unwrap();
    editor.set(MetaUpdate::new().passwords(["new"]));

    assert_eq!(
        entries(&editor),
        vec![pair("password", "new"), pair("Tag", "keep")]
    );
}

#[test]
fn test_set_empty_list_removes_type() {
    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    editor.set(MetaUpdate::new().passwords(Vec::<String>::new()));

    assert!(entries(&editor).iter().all(|(kind, _)| kind != "password"));
    assert_eq!(entries(&editor).len(), 3);
}

#[test]
fn test_set_skips_empty_values() {
    let mut editor = NzbMetaEditor::new(&document("")).unwrap();
    editor.set(MetaUpdate::new().title("").tags(["", "HD"]));
    assert_eq!(entries(&editor), vec![pair("tag", "HD")]);
}

#[test]
fn test_set_creates_head_before_files() {
    let mut editor = NzbMetaEditor::new(&document("")).unwrap();
    editor.set(MetaUpdate::new().category("TV").title("Title"));

    let output = editor.to_str().unwrap();
    let head = output.find("<head>").unwrap();
    let file = output.find("<file ").unwrap();
    assert!(head < file);
    assert_eq!(
        entries(&editor),
        vec![pair("title", "Title"), pair("category", "TV")]
    );
}

#[test]
fn test_unknown_types_sort_last() {
    let text = document(
        r#"<head>
        <meta type="x-custom">kept</meta>
        <meta type="tag">HD</meta>
    </head>"#,
    );
    let mut editor = NzbMetaEditor::new(&text).unwrap();
    editor.set(MetaUpdate::new().title("T"));

    assert_eq!(
        entries(&editor),
        vec![
            pair("title", "T"),
            pair("tag", "HD"),
            pair("x-custom", "kept"),
        ]
    );
}

#[test]
fn test_title_first_after_unknown_type() {
    let text = document(
        r#"<head>
        <meta type="name">n</meta>
        <meta type="title">old</meta>
    </head>"#,
    );
    let mut editor = NzbMetaEditor::new(&text).unwrap();
    editor.set(MetaUpdate::new().title("T"));

    assert_eq!(entries(&editor), vec![pair("title", "T"), pair("name", "n")]);
}

// ---------------------------------------------------------------------------
// append
// ---------------------------------------------------------------------------

#[test]
fn test_append_keeps_existing() {
    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    editor.append(&["another"], &["1080p", "x264"]);

    assert_eq!(
        entries(&editor),
        vec![
            pair("title", "Big Buck Bunny - S01E01.mkv"),
            pair("category", "TV"),
            pair("password", "secret"),
            pair("password", "another"),
            pair("tag", "HD"),
            pair("tag", "1080p"),
            pair("tag", "x264"),
        ]
    );
}

#[test]
fn test_append_without_head_creates_one() {
    let mut editor = NzbMetaEditor::new(&document("")).unwrap();
    editor.append(&["pw"], &[]);
    assert_eq!(entries(&editor), vec![pair("password", "pw")]);
}

#[test]
fn test_append_nothing_is_noop() {
    let mut editor = NzbMetaEditor::new(&document("")).unwrap();
    editor.append(&[], &[""]);
    assert!(!editor.to_str().unwrap().contains("<head"));
}

// ---------------------------------------------------------------------------
// remove / clear
// ---------------------------------------------------------------------------

#[test]
fn test_remove_then_append_leaves_single_password() {
    let text = document(
        r#"<head>
        <meta type="password">one</meta>
        <meta type="password">two</meta>
        <meta type="password">three</meta>
    </head>"#,
    );
    let mut editor = NzbMetaEditor::new(&text).unwrap();
    editor.remove("password").append(&["x"], &[]);

    assert_eq!(entries(&editor), vec![pair("password", "x")]);
}

#[test]
fn test_remove_is_case_sensitive() {
    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    editor.remove("TITLE");
    assert_eq!(entries(&editor).len(), 4);

    editor.remove("title");
    assert_eq!(entries(&editor).len(), 3);
}

#[test]
fn test_remove_keeps_empty_head() {
    let text = document(r#"<head><meta type="title">only</meta></head>"#);
    let mut editor = NzbMetaEditor::new(&text).unwrap();
    editor.remove("title");

    assert!(entries(&editor).is_empty());
    assert!(editor.to_str().unwrap().contains("<head/>"));
}

#[test]
fn test_remove_without_head_is_noop() {
    let mut editor = NzbMetaEditor::new(&document("")).unwrap();
    let before = editor.to_str().unwrap();
    editor.remove("title");
    assert_eq!(editor.to_str().unwrap(), before);
}

#[test]
fn test_clear_removes_head() {
    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    editor.clear();

    let output = editor.to_str().unwrap();
    assert!(!output.contains("<head"));
    assert!(!output.contains("<meta"));
    assert!(output.contains("<file "));

    // Clearing twice is harmless
    editor.clear();
    assert_eq!(editor.to_str().unwrap(), output);
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn test_output_parses_to_equal_files() {
    let original = Nzb::parse(&full_head()).unwrap();

    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    editor
        .set(MetaUpdate::new().title("Edited"))
        .append(&[], &["Extra"]);
    let edited = Nzb::parse(&editor.to_str().unwrap()).unwrap();

    assert_eq!(edited.files(), original.files());
    assert_eq!(edited.meta().title.as_deref(), Some("Edited"));
    assert_eq!(edited.meta().tags, vec!["HD", "Extra"]);
    assert_eq!(edited.meta().password(), Some("secret"));
}

#[test]
fn test_output_uses_configured_indent() {
    let editor = NzbMetaEditor::with_options(&full_head(), EditorOptions { indent: 2 }).unwrap();
    let output = editor.to_str().unwrap();
    assert!(output.contains("\n  <head>\n    <meta type=\"title\">"));
}

#[test]
fn test_to_file_and_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("edited.nzb");

    let mut editor = NzbMetaEditor::new(&full_head()).unwrap();
    editor.set(MetaUpdate::new().category("Anime"));
    let written = editor.to_file(&path, false).unwrap();
    assert!(written.is_absolute());

    let reloaded = NzbMetaEditor::from_file(&path).unwrap();
    assert_eq!(reloaded.source(), Some(path.as_path()));
    assert!(reloaded.meta_entries().contains(&pair("category", "Anime")));
}

#[test]
fn test_to_file_refuses_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("edited.nzb");
    std::fs::write(&path, "original").unwrap();

    let editor = NzbMetaEditor::new(&full_head()).unwrap();
    assert!(matches!(
        editor.to_file(&path, false).unwrap_err(),
        Error::FileExists { .. }
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");

    editor.to_file(&path, true).unwrap();
    assert!(Nzb::from_file(&path).is_ok());
}

#[test]
fn test_save_writes_back_to_source() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("source.nzb.gz");
    NzbMetaEditor::new(&full_head())
        .unwrap()
        .to_file(&path, false)
        .unwrap();

    let mut editor = NzbMetaEditor::from_file(&path).unwrap();
    editor.clear();
    assert!(matches!(
        editor.save(false).unwrap_err(),
        Error::FileExists { .. }
    ));
    editor.save(true).unwrap();

    assert!(Nzb::from_file(&path).unwrap().meta().is_empty());
}

#[test]
fn test_save_without_source() {
    let editor = NzbMetaEditor::new(&full_head()).unwrap();
    assert!(matches!(
        editor.save(true).unwrap_err(),
        Error::NoSourcePath
    ));
}
