use fleet_sounding::config::load_config_with_hash;
use fleet_sounding::roster::{parse_document, MemberClass};
use fleet_sounding::search::SearchOptions;
use std::path::Path;
use std::time::Duration;

#[test]
fn test_config_and_rosters_load_together() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let primary = temp_dir.path().join("primary.json");
    std::fs::write(
        &primary,
        serde_json::json!({
            "markdown": "**Acme Offshore Sdn Bhd**\nLot 5, Jalan Pelabuhan\nTel: 087-411 000\nwww.acme.com.my\n\
                         **Borneo Tug Services**\nTel: 088-765 432\n"
        })
        .to_string(),
    )
    .unwrap();

    let associate = temp_dir.path().join("associate.json");
    std::fs::write(
        &associate,
        serde_json::json!({ "markdown": "**Kapal Jaya**\nEmail: ops@kapaljaya.my\n" }).to_string(),
    )
    .unwrap();

    let config_path = temp_dir.path().join("fleet.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[http]
crawler-name = "FleetSounding"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "ops@example.com"

[search]
deadline-secs = 45
include-tracking = false

[output]
database-path = "{}"

[[roster]]
path = "{}"
member-class = "primary"

[[roster]]
path = "{}"
member-class = "associate"
"#,
            temp_dir.path().join("fleet.db").display(),
            primary.display(),
            associate.display()
        ),
    )
    .unwrap();

    let (config, hash) = load_config_with_hash(&config_path).expect("Failed to load config");
    assert_eq!(hash.len(), 64);

    let options = SearchOptions::from(&config.search);
    assert!(options.include_photos);
    assert!(!options.include_tracking);
    assert_eq!(options.deadline, Some(Duration::from_secs(45)));

    let mut seeds = Vec::new();
    for entry in &config.roster {
        seeds.extend(parse_document(Path::new(&entry.path), entry.member_class).unwrap());
    }

    let names: Vec<_> = seeds.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Acme Offshore Sdn Bhd", "Borneo Tug Services", "Kapal Jaya"]
    );
    assert_eq!(seeds[0].website_hint.as_deref(), Some("http://www.acme.com.my"));
    assert_eq!(seeds[2].member_class, MemberClass::Associate);
    assert_eq!(seeds[2].email.as_deref(), Some("ops@kapaljaya.my"));
}

#[test]
fn test_roster_without_markdown_field_is_rejected() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("roster.json");
    std::fs::write(&path, r#"{"text": "**Acme**"}"#).unwrap();

    assert!(parse_document(&path, MemberClass::Primary).is_err());
}
