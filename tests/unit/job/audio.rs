use super::*;

fn fetcher() -> AudioFetcher {
    AudioFetcher::new(Duration::from_secs(2)).unwrap()
}

#[test]
fn classifies_remote_and_local_sources() {
    let f = fetcher();
    assert_eq!(
        f.classify("https://cdn.example.com/a.mp3"),
        AudioSource::Remote("https://cdn.example.com/a.mp3")
    );
    assert_eq!(
        f.classify("http://localhost/a.wav"),
        AudioSource::Remote("http://localhost/a.wav")
    );
    assert_eq!(
        f.classify("/srv/audio/a.mp3"),
        AudioSource::Local(Path::new("/srv/audio/a.mp3"))
    );
    assert_eq!(
        f.classify("ftp://example.com/a.mp3"),
        AudioSource::Local(Path::new("ftp://example.com/a.mp3"))
    );
}

#[test]
fn absent_source_means_no_audio() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("audio.mp3");
    let f = fetcher();
    assert!(!f.fetch(None, &dest));
    assert!(!f.fetch(Some("  "), &dest));
    assert!(!dest.exists());
}

#[test]
fn local_source_is_copied() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("voice.mp3");
    std::fs::write(&src, b"ID3fake-audio").unwrap();
    let dest = dir.path().join("audio.mp3");

    assert!(fetcher().fetch(Some(src.to_str().unwrap()), &dest));
    assert_eq!(std::fs::read(&dest).unwrap(), b"ID3fake-audio");
}

#[test]
fn missing_local_file_degrades_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("audio.mp3");
    let missing = dir.path().join("nope.mp3");

    assert!(!fetcher().fetch(Some(missing.to_str().unwrap()), &dest));
    assert!(!dest.exists());
}

#[test]
fn unreachable_remote_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("audio.mp3");
    // Port 9 (discard) on localhost is closed on test machines.
    assert!(!fetcher().fetch(Some("http://127.0.0.1:9/a.mp3"), &dest));
    assert!(!dest.exists());
}
