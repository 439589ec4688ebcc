use super::*;

fn caption(text: &str) -> Caption {
    Caption {
        text: text.to_string(),
        font_size: 40.0,
        color: Rgba8::rgb(255, 255, 255),
        max_width: 400.0,
    }
}

/// Builds the nested stack the animator produces: group_k = [group_{k-1}, caption_k].
fn nested_stack(g: &mut SceneGraph, n: usize) -> Vec<NodeId> {
    let mut groups = Vec::new();
    for i in 0..n {
        let c = g.create_caption(caption(&format!("w{i}")), NodeProps::default());
        let grp = g.create_group();
        g.append(g.root(), grp).unwrap();
        if let Some(prev) = groups.last() {
            g.append(grp, *prev).unwrap();
        }
        g.append(grp, c).unwrap();
        groups.push(grp);
    }
    groups
}

#[test]
fn append_reparents() {
    let mut g = SceneGraph::new();
    let a = g.create_group();
    let b = g.create_group();
    g.append(g.root(), a).unwrap();
    g.append(g.root(), b).unwrap();
    g.append(b, a).unwrap();
    assert_eq!(g.children(g.root()), &[b]);
    assert_eq!(g.children(b), &[a]);
    assert_eq!(g.parent(a), Some(b));
}

#[test]
fn append_rejects_cycles_and_caption_parents() {
    let mut g = SceneGraph::new();
    let a = g.create_group();
    let b = g.create_group();
    g.append(a, b).unwrap();
    assert!(g.append(b, a).is_err());
    assert!(g.append(a, a).is_err());

    let c = g.create_caption(caption("x"), NodeProps::default());
    assert!(g.append(c, b).is_err());
    assert!(g.append(a, g.root()).is_err());
}

#[test]
fn chain_depth_counts_nested_groups() {
    let mut g = SceneGraph::new();
    let groups = nested_stack(&mut g, 4);
    assert_eq!(g.chain_depth(groups[3]), 4);
    assert_eq!(g.chain_depth(groups[0]), 1);
    assert_eq!(g.chain_depth(g.root()), 0);
}

#[test]
fn prune_clears_below_target_depth() {
    let mut g = SceneGraph::new();
    let groups = nested_stack(&mut g, 11);
    let before = g.live_count();

    // group_10 -> ... -> group_1 is 9 steps; group_1 holds [group_0, caption_1].
    let out = g.prune_branch(groups[10], 9);
    assert_eq!(out, PruneOutcome::Pruned(3));
    assert_eq!(g.live_count(), before - 3);
    assert!(g.children(groups[1]).is_empty());
    assert!(!g.contains(groups[0]));
    assert_eq!(g.chain_depth(groups[10]), 10);
}

#[test]
fn prune_on_shallow_chain_is_noop() {
    let mut g = SceneGraph::new();
    let groups = nested_stack(&mut g, 3);
    let before = g.live_count();
    assert_eq!(g.prune_branch(groups[2], 9), PruneOutcome::NoOp);
    assert_eq!(g.live_count(), before);

    let empty = g.create_group();
    assert_eq!(g.prune_branch(empty, 0), PruneOutcome::NoOp);
}

#[test]
fn draw_list_paints_in_child_order_with_inherited_opacity() {
    let mut g = SceneGraph::new();
    let grp = g.create_group();
    g.append(g.root(), grp).unwrap();
    let a = g.create_caption(caption("a"), NodeProps::at(Vec2::new(10.0, 20.0)));
    let b = g.create_caption(caption("b"), NodeProps::default().with_opacity(0.5));
    g.append(grp, a).unwrap();
    g.append(grp, b).unwrap();
    g.animate(grp, NodeProps::default().with_opacity(0.5), 0, 0, Ease::Linear)
        .unwrap();

    let items = g.draw_list(0);
    let order: Vec<_> = items.iter().map(|i| i.node).collect();
    assert_eq!(order, vec![a, b]);
    assert!((items[0].opacity - 0.5).abs() < 1e-9);
    assert!((items[1].opacity - 0.25).abs() < 1e-9);
    assert_eq!(items[0].transform.translation(), Vec2::new(10.0, 20.0));
}

#[test]
fn animate_starts_from_current_sampled_state() {
    let mut g = SceneGraph::new();
    let grp = g.create_group();
    g.animate(grp, NodeProps::default().with_scale(2.0), 0, 100, Ease::Linear)
        .unwrap();
    // Retarget mid-flight: the new tween starts from scale 1.5.
    let end = g
        .animate(grp, NodeProps::default().with_scale(1.0), 50, 100, Ease::Linear)
        .unwrap();
    assert_eq!(end, 150);
    let p = g.props_at(grp, 50).unwrap();
    assert!((p.scale.x - 1.5).abs() < 1e-9);
    assert_eq!(g.props_at(grp, 150).unwrap().scale.x, 1.0);
}

#[test]
fn rotation_pivots_around_origin() {
    let mut g = SceneGraph::new();
    let grp = g.create_group();
    g.append(g.root(), grp).unwrap();
    let c = g.create_caption(caption("x"), NodeProps::at(Vec2::new(100.0, 0.0)));
    g.append(grp, c).unwrap();
    g.set_origin(grp, Vec2::new(100.0, 0.0)).unwrap();
    let mut rotated = NodeProps::default();
    rotated.rotate_deg = 90.0;
    g.animate(grp, rotated, 0, 0, Ease::Linear).unwrap();

    // The caption anchor sits on the pivot, so it does not move.
    let items = g.draw_list(0);
    let p = items[0].transform * kurbo::Point::ZERO;
    assert!((p.x - 100.0).abs() < 1e-9 && p.y.abs() < 1e-9);
}
