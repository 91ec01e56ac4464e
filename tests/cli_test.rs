// tests/cli_test.rs
use queueloader::cli::build_cli;

#[test]
fn test_cli_basic_structure() {
    let app = build_cli();
    assert_eq!(app.get_name(), "queueloader");

    let matches = app
        .clone()
        .try_get_matches_from(vec!["queueloader", "https://example.com/v/1"])
        .unwrap();

    let urls: Vec<&String> = matches.get_many::<String>("urls").unwrap().collect();
    assert_eq!(urls, vec!["https://example.com/v/1"]);
    assert!(!matches.get_flag("interactive"));
    assert!(!matches.get_flag("save-settings"));
}

#[test]
fn test_cli_keeps_url_order() {
    let matches = build_cli()
        .try_get_matches_from(vec!["queueloader", "url1", "url2", "url3"])
        .unwrap();

    let urls: Vec<String> = matches.get_many::<String>("urls").unwrap().cloned().collect();
    assert_eq!(urls, vec!["url1", "url2", "url3"]);
}

#[test]
fn test_cli_urls_are_optional() {
    let matches = build_cli().try_get_matches_from(vec!["queueloader"]).unwrap();
    assert!(matches.get_many::<String>("urls").is_none());
}

#[test]
fn test_cli_options() {
    let app = build_cli();

    let matches = app
        .clone()
        .try_get_matches_from(vec![
            "queueloader",
            "-o",
            "/tmp/downloads",
            "--ytdlp",
            "/opt/yt-dlp",
            "--timeout",
            "120",
            "-i",
            "--save-settings",
        ])
        .unwrap();

    assert_eq!(
        matches.get_one::<String>("output-dir").unwrap(),
        "/tmp/downloads"
    );
    assert_eq!(matches.get_one::<String>("ytdlp").unwrap(), "/opt/yt-dlp");
    assert_eq!(matches.get_one::<u64>("timeout").copied(), Some(120));
    assert!(matches.get_flag("interactive"));
    assert!(matches.get_flag("save-settings"));
}

#[test]
fn test_cli_invalid_arguments() {
    let app = build_cli();

    let result = app
        .clone()
        .try_get_matches_from(vec!["queueloader", "--timeout", "soon"]);
    assert!(result.is_err());

    let result = app
        .clone()
        .try_get_matches_from(vec!["queueloader", "--quality", "720"]);
    assert!(result.is_err());
}
