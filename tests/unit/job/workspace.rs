use super::*;

#[test]
fn layout_is_scoped_by_job_id() {
    let id = Uuid::new_v4();
    let ws = JobWorkspace::new(id, Path::new("/tmp/reel"), Path::new("/out"));
    assert_eq!(ws.temp_dir(), Path::new("/tmp/reel").join(id.to_string()));
    assert_eq!(ws.frame_dir(), ws.temp_dir().join("frames"));
    assert_eq!(ws.segment_path(3), ws.temp_dir().join("segments/video-3.mp4"));
    assert_eq!(
        ws.output_path(),
        Path::new("/out").join(format!("video-{id}.mp4"))
    );
}

#[test]
fn audio_path_keeps_source_extension() {
    let ws = JobWorkspace::new(Uuid::new_v4(), Path::new("/t"), Path::new("/o"));
    assert!(ws.audio_path("https://cdn.example.com/a/voice.WAV?sig=1").ends_with("audio.wav"));
    assert!(ws.audio_path("/home/me/track.m4a").ends_with("audio.m4a"));
    assert!(ws.audio_path("https://example.com/stream").ends_with("audio.mp3"));
    assert!(ws.audio_path(".hidden").ends_with("audio.mp3"));
}

#[test]
fn host_name_is_never_taken_as_extension() {
    let ws = JobWorkspace::new(Uuid::new_v4(), Path::new("/t"), Path::new("/o"));
    for source in [
        "https://example.com",
        "https://example.com/",
        "http://cdn.example.com?file=voice.wav",
        "https://example.com#voice.ogg",
    ] {
        assert!(ws.audio_path(source).ends_with("audio.mp3"), "{source}");
    }
    assert!(ws.audio_path("https://example.com/voice.ogg").ends_with("audio.ogg"));
}

#[test]
fn create_then_cleanup_removes_everything() {
    let root = tempfile::tempdir().unwrap();
    let ws = JobWorkspace::new(
        Uuid::new_v4(),
        &root.path().join("tmp"),
        &root.path().join("out"),
    );
    ws.create().unwrap();
    assert!(ws.frame_dir().is_dir());
    assert!(ws.segment_dir().is_dir());
    assert!(root.path().join("out").is_dir());

    std::fs::write(ws.frame_dir().join("frame-0.png"), b"x").unwrap();
    ws.cleanup();
    assert!(!ws.temp_dir().exists());
    // A second cleanup is a no-op.
    ws.cleanup();
}

#[test]
fn discard_output_tolerates_missing_file() {
    let root = tempfile::tempdir().unwrap();
    let ws = JobWorkspace::new(Uuid::new_v4(), root.path(), root.path());
    ws.discard_output();
    std::fs::write(ws.output_path(), b"partial").unwrap();
    ws.discard_output();
    assert!(!ws.output_path().exists());
}
