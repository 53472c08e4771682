//! The recursive traversal and selection algorithm (spec §4.1). Grounded on
//! `abetterworld::content::tiles_priority::gather_priority_tiles`/`priortize`
//! for the recursive-descent-over-a-tree shape and
//! `abetterworld::content::tilesets::{needs_refinement, compute_sse}` for the
//! screen-space-error formula; the kick/forbid-holes/preload fix-ups have no
//! teacher counterpart (`abetterworld` has no such logic) and are written
//! fresh from spec.md's decision tree, in the same plain-recursive-function
//! style rather than a visitor (DESIGN NOTES §9).

use std::collections::HashMap;
use std::collections::HashSet;

use crate::config::TilesetOptions;
use crate::geometry::{BoundingVolume, Intersection, ViewState};
use crate::tile::{RefineMode, SelectionState, SelectionTag, TileArena, TileId};

use super::frame::FrameState;
use super::result::{LoadIntent, ViewUpdateResult};

/// Arbitrary-but-small per-level tie-breaker added to a load intent's
/// distance so that, all else equal, shallower tiles are dispatched first
/// (spec §4.1, "Priority ... is `distance_to_tile + depth_penalty`").
const DEPTH_PENALTY_WEIGHT: f64 = 1.0;

fn priority_for(distance_sq: f64, depth: u32) -> f64 {
    distance_sq.max(0.0).sqrt() + depth as f64 * DEPTH_PENALTY_WEIGHT
}

/// What a visited subtree contributed to its parent's refine decision.
struct VisitOutcome {
    all_renderable: bool,
    any_rendered_last_frame: bool,
    not_yet_renderable_count: usize,
    /// Tiles whose selection tag was freshly set to a non-kicked
    /// Rendered/Refined variant somewhere in this subtree this frame;
    /// a later ancestor kick retags exactly these (spec §4.1.4).
    newly_tagged: Vec<TileId>,
}

impl VisitOutcome {
    fn leaf(renderable: bool, any_rendered_last_frame: bool, newly_tagged: Vec<TileId>) -> Self {
        Self {
            all_renderable: renderable,
            any_rendered_last_frame,
            not_yet_renderable_count: if renderable { 0 } else { 1 },
            newly_tagged,
        }
    }
}

/// Bucket rank, used to let a later fix-up (forbid-holes, kick) *upgrade*
/// a tile already queued at a lower priority into a higher bucket, rather
/// than being silently dropped by the per-frame dedup (spec §4.1, "High:
/// tiles whose load is blocking refinement (forbid-holes, or the root of a
/// would-refine subtree that is kicked)" — that promise only holds if a
/// tile already queued Medium/Low by its own leaf visit can still move up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    Low,
    Medium,
    High,
}

/// Accumulates the frame's traversal output while it's being built; folded
/// into a `ViewUpdateResult` once the root visit returns.
struct Accumulator {
    render_list: Vec<TileId>,
    high: Vec<LoadIntent>,
    medium: Vec<LoadIntent>,
    low: Vec<LoadIntent>,
    queued: HashMap<TileId, Bucket>,
    tiles_visited: u64,
    culled_tiles_visited: u64,
    max_depth_visited: u32,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            render_list: Vec::new(),
            high: Vec::new(),
            medium: Vec::new(),
            low: Vec::new(),
            queued: HashMap::new(),
            tiles_visited: 0,
            culled_tiles_visited: 0,
            max_depth_visited: 0,
        }
    }

    fn bucket_vec(&mut self, bucket: Bucket) -> &mut Vec<LoadIntent> {
        match bucket {
            Bucket::High => &mut self.high,
            Bucket::Medium => &mut self.medium,
            Bucket::Low => &mut self.low,
        }
    }

    /// Queues `tile` into `bucket`, upgrading it out of whatever lower
    /// bucket it already sat in (and leaving it alone if it's already in an
    /// equal-or-higher one). A tile only ever has one outstanding intent at
    /// a time, matching spec §4.2.1's per-frame dedup.
    fn queue(&mut self, bucket: Bucket, tile: TileId, priority: f64) {
        if let Some(&existing) = self.queued.get(&tile) {
            if existing >= bucket {
                return;
            }
            self.bucket_vec(existing).retain(|intent| intent.tile != tile);
        }
        self.queued.insert(tile, bucket);
        self.bucket_vec(bucket).push(LoadIntent { tile, priority });
    }

    fn queue_high(&mut self, tile: TileId, priority: f64) {
        self.queue(Bucket::High, tile, priority);
    }

    fn queue_medium(&mut self, tile: TileId, priority: f64) {
        self.queue(Bucket::Medium, tile, priority);
    }

    fn queue_low(&mut self, tile: TileId, priority: f64) {
        self.queue(Bucket::Low, tile, priority);
    }
}

fn wants_load(tile: &crate::tile::Tile) -> bool {
    tile.content_uri.is_some() && !tile.state.is_loaded() && !tile.state.is_loading() && !tile.state.is_failed()
}

fn was_rendered_last_frame(state: &SelectionState, previous_frame_number: u64) -> bool {
    state.frame == previous_frame_number
        && matches!(
            state.tag,
            SelectionTag::Rendered
                | SelectionTag::Refined
                | SelectionTag::RenderedAndKicked
                | SelectionTag::RefinedAndKicked
        )
}

fn set_tag(arena: &mut TileArena, id: TileId, tag: SelectionTag, frame: u64) {
    arena[id].last_selection_state = SelectionState { tag, frame };
}

fn retag_as_kicked(arena: &mut TileArena, id: TileId) {
    let tile = &mut arena[id];
    tile.last_selection_state.tag = match tile.last_selection_state.tag {
        SelectionTag::Rendered => SelectionTag::RenderedAndKicked,
        SelectionTag::Refined => SelectionTag::RefinedAndKicked,
        other => other,
    };
}

/// Drives the full recursive descent. Pure with respect to tree topology:
/// it only ever reads `children`/`parent` and writes per-tile scratch
/// fields (spec §4.1 contract).
pub struct Selector {
    options: TilesetOptions,
    frame_number: u64,
    previous_render_set: HashSet<TileId>,
    last_result: ViewUpdateResult,
}

impl Selector {
    pub fn new(options: TilesetOptions) -> Self {
        Self {
            options,
            frame_number: 0,
            previous_render_set: HashSet::new(),
            last_result: ViewUpdateResult::default(),
        }
    }

    pub fn options(&self) -> &TilesetOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut TilesetOptions {
        &mut self.options
    }

    pub fn last_result(&self) -> &ViewUpdateResult {
        &self.last_result
    }

    /// Runs one frame of traversal from `root`, producing a fresh
    /// `ViewUpdateResult` (spec §4.1 contract: `update_view(view_state) ->
    /// &ViewUpdateResult`).
    pub fn update_view(&mut self, view: &ViewState, root: TileId, tree: &mut TileArena) -> &ViewUpdateResult {
        self.frame_number += 1;
        let frame = FrameState::new(view, &self.options, self.frame_number);
        let mut acc = Accumulator::new();

        let distance_sq = view.distance_squared_to(&tree[root].bounding_volume);
        visit(root, 0, distance_sq, view, &frame, &self.options, tree, &mut acc);

        let current_render_set: HashSet<TileId> = acc.render_list.iter().copied().collect();
        let tiles_to_no_longer_render_this_frame = self
            .previous_render_set
            .difference(&current_render_set)
            .copied()
            .collect();

        acc.high.sort_by(|a, b| a.priority.partial_cmp(&b.priority).unwrap());
        acc.medium.sort_by(|a, b| a.priority.partial_cmp(&b.priority).unwrap());
        acc.low.sort_by(|a, b| a.priority.partial_cmp(&b.priority).unwrap());

        self.last_result = ViewUpdateResult {
            tiles_to_render_this_frame: acc.render_list,
            tiles_loading_high_priority: acc.high,
            tiles_loading_medium_priority: acc.medium,
            tiles_loading_low_priority: acc.low,
            tiles_to_no_longer_render_this_frame,
            tiles_visited: acc.tiles_visited,
            culled_tiles_visited: acc.culled_tiles_visited,
            max_depth_visited: acc.max_depth_visited,
        };
        self.previous_render_set = current_render_set;
        &self.last_result
    }
}

/// Visibility against the frustum, the viewer-request-volume, and fog
/// (spec §4.1.1), plus whether invisibility here should stop descent
/// outright (the literal frustum-cull case) as opposed to merely
/// excluding the tile from render/load while still traversing it for
/// bookkeeping (spec's "culled and culled-SSE enforcement is off" case).
struct Visibility {
    visible: bool,
    culling_disables_descent: bool,
}

fn classify_visibility(
    tile_volume: &BoundingVolume,
    viewer_request_volume: Option<&BoundingVolume>,
    distance: f64,
    view: &ViewState,
    frame: &FrameState,
    options: &TilesetOptions,
) -> Visibility {
    let mut frustum_visible = true;
    let mut culling_disables_descent = false;
    if options.enable_frustum_culling {
        let intersection = tile_volume.intersect_frustum(&frame.planes);
        frustum_visible = intersection != Intersection::Outside;
        if !frustum_visible && options.render_tiles_under_camera {
            if let (BoundingVolume::Region(r), Some((lon, lat))) = (tile_volume, frame.eye_lon_lat_rad) {
                if lon >= r.west && lon <= r.east && lat >= r.south && lat <= r.north {
                    frustum_visible = true;
                }
            }
        }
        culling_disables_descent = !frustum_visible;
    }

    let viewer_request_ok = viewer_request_volume.map_or(true, |v| v.contains_point(view.eye));

    let fog_ok = !options.enable_fog_culling || !frame.fog_culled(distance);

    Visibility {
        visible: frustum_visible && viewer_request_ok && fog_ok,
        culling_disables_descent,
    }
}

#[allow(clippy::too_many_arguments)]
fn visit(
    id: TileId,
    depth: u32,
    distance_sq: f64,
    view: &ViewState,
    frame: &FrameState,
    options: &TilesetOptions,
    tree: &mut TileArena,
    acc: &mut Accumulator,
) -> VisitOutcome {
    acc.tiles_visited += 1;
    acc.max_depth_visited = acc.max_depth_visited.max(depth);

    let distance = distance_sq.max(0.0).sqrt();
    let geometric_error = tree[id].geometric_error;
    let refine = tree[id].refine;
    let has_children = !tree[id].children.is_empty();
    let previous_tag = tree[id].last_selection_state;

    let visibility = {
        let tile = &tree[id];
        classify_visibility(
            &tile.bounding_volume,
            tile.viewer_request_volume.as_ref(),
            distance,
            view,
            frame,
            options,
        )
    };

    if !visibility.visible && visibility.culling_disables_descent {
        acc.culled_tiles_visited += 1;
        set_tag(tree, id, SelectionTag::Culled, frame.frame_number);
        return VisitOutcome::leaf(true, false, Vec::new());
    }

    // A tile that's invisible for a reason other than a literal frustum
    // cull (fog, viewer-request-volume, or frustum culling disabled) is
    // still traversed, but judged against the relaxed `culled_screen_space_
    // error` threshold unless the host insists on the strict one. This is
    // the only sensible reading that actually uses `culled_screen_space_
    // error` as a distinct threshold rather than a no-op flag.
    let is_culled_for_sse = !visibility.visible;
    let sse_threshold = if is_culled_for_sse && !options.enforce_culled_screen_space_error {
        options.culled_screen_space_error
    } else {
        options.maximum_screen_space_error
    };
    let eps_distance = distance.max(1e-2);
    let denom = (view.fov_y_radians * 0.5).tan() * 2.0;
    let sse = if denom.is_finite() && denom > 0.0 {
        (geometric_error * view.viewport_height) / (denom * eps_distance)
    } else {
        f64::INFINITY
    };
    let meets_sse = sse <= sse_threshold;

    if meets_sse || !has_children {
        if !visibility.visible {
            acc.culled_tiles_visited += 1;
            set_tag(tree, id, SelectionTag::Culled, frame.frame_number);
            let renderable = tree[id].is_renderable();
            return VisitOutcome::leaf(
                renderable,
                was_rendered_last_frame(&previous_tag, frame.previous_frame_number),
                Vec::new(),
            );
        }

        if wants_load(&tree[id]) {
            acc.queue_medium(id, priority_for(distance_sq, depth));
        }
        acc.render_list.push(id);
        set_tag(tree, id, SelectionTag::Rendered, frame.frame_number);
        let renderable = tree[id].is_renderable();
        return VisitOutcome::leaf(
            renderable,
            was_rendered_last_frame(&previous_tag, frame.previous_frame_number),
            vec![id],
        );
    }

    // Refine: gather children, sorted front-to-back by distance.
    let mut children: Vec<(TileId, f64)> = tree[id]
        .children
        .iter()
        .map(|&c| (c, view.distance_squared_to(&tree[c].bounding_volume)))
        .collect();
    children.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    if options.preload_ancestors && wants_load(&tree[id]) {
        acc.queue_low(id, priority_for(distance_sq, depth));
    }

    let render_mark = acc.render_list.len();
    if refine == RefineMode::Add {
        if wants_load(&tree[id]) {
            acc.queue_medium(id, priority_for(distance_sq, depth));
        }
        acc.render_list.push(id);
    }

    let mut newly_tagged = Vec::new();
    let mut child_outcomes = Vec::with_capacity(children.len());
    for &(child_id, child_distance_sq) in &children {
        let child_visibility = {
            let child = &tree[child_id];
            classify_visibility(
                &child.bounding_volume,
                child.viewer_request_volume.as_ref(),
                child_distance_sq.max(0.0).sqrt(),
                view,
                frame,
                options,
            )
        };
        if !child_visibility.visible && child_visibility.culling_disables_descent {
            acc.culled_tiles_visited += 1;
            acc.tiles_visited += 1;
            set_tag(tree, child_id, SelectionTag::Culled, frame.frame_number);
            if options.preload_siblings && wants_load(&tree[child_id]) {
                acc.queue_low(child_id, priority_for(child_distance_sq, depth + 1));
            }
            continue;
        }
        let outcome = visit(child_id, depth + 1, child_distance_sq, view, frame, options, tree, acc);
        newly_tagged.extend_from_slice(&outcome.newly_tagged);
        child_outcomes.push((child_id, outcome));
    }

    let all_children_renderable = child_outcomes.iter().all(|(_, o)| o.all_renderable);
    let any_rendered_last_frame = child_outcomes.iter().any(|(_, o)| o.any_rendered_last_frame);
    let not_yet_renderable_count: usize = child_outcomes.iter().map(|(_, o)| o.not_yet_renderable_count).sum();

    // 4.1.3 forbid-holes: a REPLACE tile may only actually refine when
    // every visible child subtree is fully renderable.
    if refine == RefineMode::Replace && options.forbid_holes && !all_children_renderable {
        for (child_id, outcome) in &child_outcomes {
            if !outcome.all_renderable && wants_load(&tree[*child_id]) {
                acc.queue_high(*child_id, priority_for(view.distance_squared_to(&tree[*child_id].bounding_volume), depth + 1));
            }
        }
        acc.render_list.truncate(render_mark);
        if wants_load(&tree[id]) {
            acc.queue_medium(id, priority_for(distance_sq, depth));
        }
        acc.render_list.push(id);
        set_tag(tree, id, SelectionTag::Rendered, frame.frame_number);
        let renderable = tree[id].is_renderable();
        return VisitOutcome::leaf(
            renderable,
            was_rendered_last_frame(&previous_tag, frame.previous_frame_number),
            vec![id],
        );
    }

    let (subtree_all_renderable, subtree_not_yet_renderable) = match refine {
        RefineMode::Replace => (all_children_renderable, not_yet_renderable_count),
        RefineMode::Add => {
            let self_renderable = tree[id].is_renderable();
            (
                self_renderable && all_children_renderable,
                not_yet_renderable_count + if self_renderable { 0 } else { 1 },
            )
        }
    };

    // 4.1.4 kick: undo this subtree's descendant contributions and render
    // the current tile instead when too much of it isn't ready yet.
    let kick_needed = subtree_not_yet_renderable > 0
        && (subtree_not_yet_renderable > options.loading_descendant_limit || !any_rendered_last_frame);

    if kick_needed {
        acc.render_list.truncate(render_mark);
        for &tagged_id in &newly_tagged {
            retag_as_kicked(tree, tagged_id);
        }
        if refine == RefineMode::Add {
            retag_as_kicked(tree, id);
        }
        if wants_load(&tree[id]) {
            acc.queue_high(id, priority_for(distance_sq, depth));
        }
        acc.render_list.push(id);
        set_tag(tree, id, SelectionTag::Rendered, frame.frame_number);
        let renderable = tree[id].is_renderable();
        return VisitOutcome::leaf(
            renderable,
            was_rendered_last_frame(&previous_tag, frame.previous_frame_number),
            vec![id],
        );
    }

    // Not kicked: the tile delegates to its (already-selected) children.
    set_tag(tree, id, SelectionTag::Refined, frame.frame_number);
    newly_tagged.push(id);
    VisitOutcome {
        all_renderable: subtree_all_renderable,
        any_rendered_last_frame,
        not_yet_renderable_count: subtree_not_yet_renderable,
        newly_tagged,
    }
}
