use threadline_content::{AttachmentPolicy, AttachmentRejection, MAX_ATTACHMENT_BYTES};
use threadline_types::AttachmentCandidate;

fn sized(name: &str, mime: &str, size: u64) -> AttachmentCandidate {
    let mut candidate = AttachmentCandidate::new(name, mime, Vec::new());
    candidate.size = size;
    candidate
}

#[test]
fn test_oversized_file_rejected_regardless_of_type() {
    let policy = AttachmentPolicy::default();
    let candidate = sized("video.pdf", "application/pdf", 60 * 1024 * 1024);

    let err = policy.validate(&candidate).unwrap_err();
    assert!(matches!(err, AttachmentRejection::TooLarge { limit, .. } if limit == MAX_ATTACHMENT_BYTES));
    assert!(err.to_string().contains("video.pdf"));
    assert!(err.to_string().contains("50MB"));
}

#[test]
fn test_small_allowed_file_accepted() {
    let policy = AttachmentPolicy::default();
    let candidate = AttachmentCandidate::new("notes.txt", "text/plain", vec![b'a'; 1024]);
    assert!(policy.validate(&candidate).is_ok());
}

#[test]
fn test_audio_is_allowed() {
    let policy = AttachmentPolicy::default();
    assert!(policy.validate(&sized("memo.mp3", "audio/mpeg", 2048)).is_ok());
}

#[test]
fn test_batch_partial_acceptance() {
    let policy = AttachmentPolicy::default();
    let batch = policy.validate_batch(vec![
        sized("a.png", "image/png", 1024),
        sized("setup.exe", "application/x-msdownload", 1024),
        sized("b.csv", "text/csv", 1024),
    ]);

    assert_eq!(batch.accepted.len(), 2);
    assert_eq!(batch.rejected.len(), 1);
    assert_eq!(batch.rejected[0].filename(), "setup.exe");
    assert_eq!(
        batch.rejected[0].to_string(),
        "File type application/x-msdownload is not supported for setup.exe"
    );
}

#[test]
fn test_custom_policy_from_config_shape() {
    let policy: AttachmentPolicy = serde_json::from_value(serde_json::json!({
        "max_size_bytes": 10,
        "allowed_mime_types": ["text/plain"]
    }))
    .unwrap();

    assert!(policy.validate(&sized("a.txt", "text/plain", 10)).is_ok());
    assert!(policy.validate(&sized("a.txt", "text/plain", 11)).is_err());
    assert!(policy.validate(&sized("a.png", "image/png", 1)).is_err());
}
