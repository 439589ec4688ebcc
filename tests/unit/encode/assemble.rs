use std::sync::Mutex;

use uuid::Uuid;

use super::*;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Segment {
        first: usize,
        len: usize,
        audio: bool,
        out: PathBuf,
    },
    Concat {
        segments: Vec<PathBuf>,
        audio: bool,
    },
}

#[derive(Default)]
struct FakeEncoder {
    calls: Mutex<Vec<Call>>,
    fail_on_first_index: Option<usize>,
}

impl SegmentEncoder for FakeEncoder {
    fn encode_segment(&self, req: &SegmentRequest<'_>, _cancel: &CancelToken) -> ReelResult<()> {
        let first = req.frames[0].index;
        self.calls.lock().unwrap().push(Call::Segment {
            first,
            len: req.frames.len(),
            audio: req.audio.is_some(),
            out: req.out_path.to_path_buf(),
        });
        if self.fail_on_first_index == Some(first) {
            return Err(ReelError::encode("simulated encoder failure"));
        }
        std::fs::write(req.out_path, b"segment").unwrap();
        Ok(())
    }

    fn concat_segments(&self, req: &ConcatRequest<'_>, _cancel: &CancelToken) -> ReelResult<()> {
        self.calls.lock().unwrap().push(Call::Concat {
            segments: req.segments.to_vec(),
            audio: req.audio.is_some(),
        });
        std::fs::write(req.out_path, b"final").unwrap();
        Ok(())
    }
}

fn frames(n: usize) -> Vec<FrameRecord> {
    (0..n)
        .map(|index| FrameRecord {
            index,
            duration_ms: 100,
        })
        .collect()
}

fn workspace(root: &Path) -> JobWorkspace {
    let ws = JobWorkspace::new(Uuid::new_v4(), &root.join("tmp"), &root.join("out"));
    ws.create().unwrap();
    ws
}

fn opts(max: usize, parallel: bool) -> AssembleOpts {
    AssembleOpts {
        max_frames_per_segment: max,
        parallel,
        threads: Some(2),
    }
}

#[test]
fn short_sequences_encode_once_with_audio() {
    let root = tempfile::tempdir().unwrap();
    let ws = workspace(root.path());
    let enc = FakeEncoder::default();
    let mut states = Vec::new();

    let asm = Assembler::new(&enc, opts(5, false), CancelToken::new());
    let out = asm
        .assemble(&frames(5), &ws, Some(Path::new("/a.mp3")), &mut |s| {
            states.push(s)
        })
        .unwrap();

    assert_eq!(out.encoder_calls, 1);
    assert_eq!(out.segments, 1);
    assert_eq!(out.output, ws.output_path());
    assert_eq!(states, vec![JobState::Encoding]);
    let calls = enc.calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![Call::Segment {
            first: 0,
            len: 5,
            audio: true,
            out: ws.output_path().to_path_buf(),
        }]
    );
}

#[test]
fn long_sequences_encode_k_segments_then_concat() {
    let root = tempfile::tempdir().unwrap();
    let ws = workspace(root.path());
    let enc = FakeEncoder::default();
    let mut states = Vec::new();

    let asm = Assembler::new(&enc, opts(4, false), CancelToken::new());
    let out = asm
        .assemble(&frames(11), &ws, Some(Path::new("/a.mp3")), &mut |s| {
            states.push(s)
        })
        .unwrap();

    assert_eq!(out.segments, 3);
    assert_eq!(out.encoder_calls, 4);
    assert_eq!(states, vec![JobState::Encoding, JobState::Concatenating]);

    let calls = enc.calls.lock().unwrap();
    let firsts: Vec<(usize, usize, bool)> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Segment {
                first, len, audio, ..
            } => Some((*first, *len, *audio)),
            Call::Concat { .. } => None,
        })
        .collect();
    assert_eq!(firsts, vec![(0, 4, false), (4, 4, false), (8, 3, false)]);
    assert_eq!(
        calls.last().unwrap(),
        &Call::Concat {
            segments: (0..3).map(|i| ws.segment_path(i)).collect(),
            audio: true,
        }
    );
    drop(calls);

    // Segments are folded into the output and removed.
    assert!((0..3).all(|i| !ws.segment_path(i).exists()));
    assert!(ws.output_path().exists());
}

#[test]
fn audio_is_never_muxed_without_a_fetched_track() {
    let root = tempfile::tempdir().unwrap();
    let ws = workspace(root.path());
    let enc = FakeEncoder::default();
    let asm = Assembler::new(&enc, opts(2, false), CancelToken::new());
    asm.assemble(&frames(3), &ws, None, &mut |_| {}).unwrap();

    let calls = enc.calls.lock().unwrap();
    assert!(calls.iter().all(|c| match c {
        Call::Segment { audio, .. } | Call::Concat { audio, .. } => !audio,
    }));
}

#[test]
fn a_failed_segment_aborts_the_rest() {
    let root = tempfile::tempdir().unwrap();
    let ws = workspace(root.path());
    let enc = FakeEncoder {
        fail_on_first_index: Some(4),
        ..FakeEncoder::default()
    };
    let mut states = Vec::new();
    let asm = Assembler::new(&enc, opts(4, false), CancelToken::new());
    let err = asm
        .assemble(&frames(12), &ws, None, &mut |s| states.push(s))
        .unwrap_err();

    assert!(matches!(err, ReelError::Encode(_)));
    assert_eq!(enc.calls.lock().unwrap().len(), 2);
    assert!(!states.contains(&JobState::Concatenating));
    assert!(!ws.output_path().exists());
}

#[test]
fn parallel_segments_concat_in_chunk_order() {
    let root = tempfile::tempdir().unwrap();
    let ws = workspace(root.path());
    let enc = FakeEncoder::default();
    let asm = Assembler::new(&enc, opts(3, true), CancelToken::new());
    let out = asm.assemble(&frames(10), &ws, None, &mut |_| {}).unwrap();

    assert_eq!(out.encoder_calls, 5);
    let calls = enc.calls.lock().unwrap();
    let Some(Call::Concat { segments, .. }) = calls.last() else {
        panic!("concatenation must be the last call");
    };
    assert_eq!(
        *segments,
        (0..4).map(|i| ws.segment_path(i)).collect::<Vec<_>>()
    );
    let mut firsts: Vec<usize> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Segment { first, .. } => Some(*first),
            Call::Concat { .. } => None,
        })
        .collect();
    firsts.sort_unstable();
    assert_eq!(firsts, vec![0, 3, 6, 9]);
}

#[test]
fn parallel_failure_is_reported() {
    let root = tempfile::tempdir().unwrap();
    let ws = workspace(root.path());
    let enc = FakeEncoder {
        fail_on_first_index: Some(0),
        ..FakeEncoder::default()
    };
    let asm = Assembler::new(&enc, opts(2, true), CancelToken::new());
    let err = asm.assemble(&frames(8), &ws, None, &mut |_| {}).unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(
        !enc.calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| matches!(c, Call::Concat { .. }))
    );
}

#[test]
fn cancellation_stops_before_encoding() {
    let root = tempfile::tempdir().unwrap();
    let ws = workspace(root.path());
    let enc = FakeEncoder::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let asm = Assembler::new(&enc, opts(2, false), cancel);
    let err = asm.assemble(&frames(5), &ws, None, &mut |_| {}).unwrap_err();
    assert!(matches!(err, ReelError::Cancelled(_)));
    assert!(enc.calls.lock().unwrap().is_empty());
}

#[test]
fn empty_frame_list_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let ws = workspace(root.path());
    let enc = FakeEncoder::default();
    let asm = Assembler::new(&enc, AssembleOpts::default(), CancelToken::new());
    assert!(asm.assemble(&[], &ws, None, &mut |_| {}).is_err());
}
