use insta::assert_json_snapshot;
use tbem::test_info::{unit_test_info, BuildConfig, UNIT_TEST_NAMES};

#[test]
fn registry_contains_every_unit_test() {
    let info = unit_test_info(&BuildConfig::default());
    assert_eq!(info.len(), 21);
    assert!(info.keys().map(String::as_str).eq(UNIT_TEST_NAMES.iter().copied()));
    for (name, test) in &info {
        assert_eq!(test.src, format!("test_{}", name));
    }

    let unlinked: Vec<_> = info
        .iter()
        .filter(|(_, test)| !test.link_lib)
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(unlinked, vec!["richardson"]);

    let with_lib_srcs: Vec<_> = info
        .iter()
        .filter(|(_, test)| !test.lib_srcs.is_empty())
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(with_lib_srcs, vec!["integral_term", "quadrature"]);
    assert_eq!(info["integral_term"].lib_srcs, vec!["src/integral_term"]);
}

#[test]
fn registry_entries_follow_source_directory() {
    let config = BuildConfig::from_json_str(r#"{ "subdirs": { "src_dir": "lib" } }"#).unwrap();
    let info = unit_test_info(&config);
    assert_json_snapshot!(info["quadrature"], @r###"
    {
      "src": "test_quadrature",
      "lib_srcs": [
        "lib/quadrature"
      ],
      "link_lib": true
    }
    "###);
    assert_json_snapshot!(info["richardson"], @r###"
    {
      "src": "test_richardson",
      "lib_srcs": [],
      "link_lib": false
    }
    "###);
}

#[test]
fn build_config_defaults() {
    assert_eq!(BuildConfig::from_json_str("{}").unwrap(), BuildConfig::default());
    assert_eq!(BuildConfig::default().subdirs.src_dir, "src");
    assert!(BuildConfig::from_json_str("[1, 2]").is_err());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "subdirs": {} }"#).unwrap();
    assert_eq!(BuildConfig::from_json_file(&path).unwrap(), BuildConfig::default());
    assert!(BuildConfig::from_json_file(dir.path().join("missing.json")).is_err());
}
