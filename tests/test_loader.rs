//! Bulk initialization from a directory of srcML files.
#![cfg(feature = "srcml")]

use std::fs;

use srcdata::{Error, WorkingSet, WorkingSetConfig};
use tempfile::TempDir;

const ARCHIVE: &str = r#"<unit xmlns="http://www.srcML.org/srcML/src" revision="1.0.0">
<unit language="C" filename="src/util.c"><function><type><name>int</name></type> <name>twice</name><parameter_list>(<parameter><decl><type><name>int</name></type> <name>v</name></decl></parameter>)</parameter_list> <block>{<block_content> <return>return <expr><name>v</name> <operator>*</operator> <literal type="number">2</literal></expr>;</return> </block_content>}</block></function></unit>
<unit language="C" filename="src/main.c"><function><type><name>int</name></type> <name>main</name><parameter_list>()</parameter_list> <block>{<block_content> <return>return <expr><call><name>twice</name><argument_list>(<argument><expr><literal type="number">21</literal></expr></argument>)</argument_list></call></expr>;</return> </block_content>}</block></function></unit>
</unit>"#;

#[test]
fn test_initialize_from_directory() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("project.xml"), ARCHIVE).expect("write archive");
    fs::write(dir.path().join("broken.xml"), "<unit><function></unit>").expect("write broken");
    fs::write(dir.path().join("README.md"), "not srcML").expect("write readme");

    for parallel in [true, false] {
        let ws = WorkingSet::new(WorkingSetConfig::default().with_parallel_load(parallel));
        let report = ws.initialize_from_directory(dir.path()).expect("loads");
        assert_eq!(report.loaded, 2);
        assert_eq!(report.parse_errors.len(), 1);
        assert!(report.parse_errors[0].file.ends_with("broken.xml"));

        let mut files: Vec<String> = ws.files().iter().map(|f| f.to_string()).collect();
        files.sort();
        assert_eq!(files, vec!["src/main.c", "src/util.c"]);

        let stats = ws.statistics().expect("stats");
        assert_eq!(stats.files, 2);
        assert_eq!(stats.methods, 2);
        assert_eq!(stats.method_calls, 1);
        assert_eq!(stats.error_count, 1);
        assert_eq!(ws.errors().values().map(Vec::len).sum::<usize>(), 1);

        assert!(ws.check_calls("src/main.c").expect("checks").is_empty());
    }
}

#[test]
fn test_missing_directory() {
    let dir = TempDir::new().expect("temp dir");
    let ws = WorkingSet::default();
    let err = ws.initialize_from_directory(&dir.path().join("absent"));
    assert!(matches!(err, Err(Error::Io { .. })));
}
