use super::*;

#[test]
fn chunk_count_is_ceiling_and_order_is_kept() {
    let items: Vec<u32> = (0..23).collect();
    for m in [1usize, 5, 7, 22, 23, 50] {
        let chunks = split_frames(&items, m).unwrap();
        assert_eq!(chunks.len(), items.len().div_ceil(m), "m={m}");
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= m));
        let joined: Vec<u32> = chunks.concat();
        assert_eq!(joined, items);
    }
}

#[test]
fn only_the_last_chunk_is_short() {
    let items: Vec<u32> = (0..11).collect();
    let chunks = split_frames(&items, 4).unwrap();
    let lens: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(lens, vec![4, 4, 3]);
}

#[test]
fn zero_limit_is_rejected() {
    assert!(split_frames(&[1, 2, 3], 0).is_err());
}

#[test]
fn empty_input_yields_no_chunks() {
    let items: [u8; 0] = [];
    assert!(split_frames(&items, 3).unwrap().is_empty());
}
