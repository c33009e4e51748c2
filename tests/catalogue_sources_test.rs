use course_reco::adapters::catalogue::{load_catalogue, source_for, CsvFileCatalogue, HttpCatalogue, JsonFileCatalogue};
use course_reco::domain::ports::CatalogueSource;
use course_reco::RecoError;
use httpmock::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_json_file_catalogue() {
    let file = temp_file(
        r#"[
            {"code": "200", "name": "Databases", "cfu": 6, "semester": 1, "language": "en", "group": "SYSTEMS"},
            {"code": "100", "name": "Algorithms", "cfu": "9", "semester": 2, "group": "THEORY"}
        ]"#,
        ".json",
    );

    let source = JsonFileCatalogue::new(file.path());
    let catalogue = load_catalogue(&source).await.unwrap();

    assert_eq!(catalogue.len(), 2);
    assert_eq!(catalogue.courses()[0].code, "100");
    assert_eq!(catalogue.get("100").unwrap().cfu, 9.0);
    assert_eq!(catalogue.get("100").unwrap().language, "UNKNOWN");
    assert_eq!(catalogue.get("200").unwrap().language, "EN");
}

#[tokio::test]
async fn test_csv_file_catalogue() {
    let file = temp_file(
        "code,name,cfu,semester,language,group,ssd,description,keywords,lecturer,exam_types\n\
         100,Algorithms,6,1,EN,THEORY,INF/01,Graphs and complexity,graphs;complexity,A. Rossi,written;oral\n\
         200,\"Networks, advanced\",9,2,IT,SYSTEMS,ING-INF/05,,,,project\n",
        ".csv",
    );

    let source = source_for("auto", file.path().to_str().unwrap()).unwrap();
    assert!(source.describe().starts_with("csv"));
    let catalogue = load_catalogue(source.as_ref()).await.unwrap();

    let algorithms = catalogue.get("100").unwrap();
    assert_eq!(algorithms.keywords, vec!["graphs", "complexity"]);
    assert_eq!(algorithms.exam_types, vec!["written", "oral"]);
    assert_eq!(algorithms.lecturer.as_deref(), Some("A. Rossi"));

    let networks = catalogue.get("200").unwrap();
    assert_eq!(networks.name, "Networks, advanced");
    assert!(networks.lecturer.is_none());
    assert!(networks.keywords.is_empty());
}

#[tokio::test]
async fn test_duplicate_codes_fail_fast() {
    let file = temp_file(
        r#"[{"code": "100", "name": "A"}, {"code": " 100 ", "name": "B"}]"#,
        ".json",
    );
    let err = load_catalogue(&JsonFileCatalogue::new(file.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, RecoError::DuplicateCourse { code } if code == "100"));
}

#[tokio::test]
async fn test_missing_file_is_an_io_error() {
    let source = CsvFileCatalogue::new("/definitely/not/here.csv");
    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, RecoError::IoError(_)));
}

#[tokio::test]
async fn test_http_catalogue() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/courses");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "courses": [
                    {"code": "100", "name": "Algorithms", "cfu": 6, "semester": 1, "language": "EN", "group": "THEORY"},
                    {"code": "200", "name": "Logic", "cfu": 6, "semester": 1, "language": "EN", "group": "THEORY"}
                ]
            }));
    });

    let source = HttpCatalogue::new(server.url("/courses"));
    let catalogue = load_catalogue(&source).await.unwrap();

    mock.assert();
    assert_eq!(catalogue.len(), 2);
}

#[tokio::test]
async fn test_http_failure_status() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/courses");
        then.status(503);
    });

    let err = HttpCatalogue::new(server.url("/courses"))
        .fetch()
        .await
        .unwrap_err();

    mock.assert();
    assert!(matches!(err, RecoError::CatalogueSource { .. }));
    assert_eq!(err.severity().exit_code(), 2);
}
