/// Two-phase depth-first scene traversal.
///
/// For every node, in stored child order:
/// 1. push `parent_world * local` onto the world stack
/// 2. before-children phase (pre-order)
/// 3. recurse into each child
/// 4. after-children phase (post-order)
/// 5. pop the world stack and check the camera stack is back to the depth
///    it had when the node was entered
///
/// Draw order is exactly traversal order; nothing is sorted or batched.

use crate::error::{Error, Result};
use crate::engine_fail;
use super::node::SceneNode;
use super::render_context::{RenderContext, VisitPhase};

/// Renders a scene tree into a `RenderContext`
///
/// Stateless: one renderer can serve any number of trees and frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneRenderer;

impl SceneRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Traverse `root` and everything below it once
    pub fn render(&self, root: &SceneNode, ctx: &mut RenderContext) -> Result<()> {
        let world_depth = ctx.world_depth();
        self.visit(root, ctx)?;
        debug_assert_eq!(ctx.world_depth(), world_depth);

        let stats = ctx.stats();
        crate::engine_trace!("arbor3d::SceneRenderer",
            "Frame done: {} nodes, {} draw calls", stats.nodes_exited, stats.draw_calls);
        Ok(())
    }

    fn visit(&self, node: &SceneNode, ctx: &mut RenderContext) -> Result<()> {
        let camera_depth = ctx.camera_depth();
        ctx.push_world(node.local_matrix());

        ctx.record_visit(node.name(), VisitPhase::BeforeChildren);
        ctx.stats_mut().nodes_entered += 1;
        node.render_before_children(ctx)?;

        for child in node.children() {
            self.visit(child, ctx)?;
        }

        node.render_after_children(ctx)?;
        ctx.stats_mut().nodes_exited += 1;
        ctx.record_visit(node.name(), VisitPhase::AfterChildren);

        ctx.pop_world();
        if ctx.camera_depth() != camera_depth {
            engine_fail!("arbor3d::SceneRenderer", Error::UnbalancedStack {
                node: node.name().to_string(),
                expected: camera_depth,
                actual: ctx.camera_depth(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "traversal_tests.rs"]
mod tests;
