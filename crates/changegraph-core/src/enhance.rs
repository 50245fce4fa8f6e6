//! Attaches parser findings to graph nodes

use crate::collaborators::ModuleParser;
use crate::error::EnhancementError;
use crate::model::{DependencyNode, NodeType};

/// Wraps a [`ModuleParser`] and turns its output into new node values.
#[derive(Clone, Copy)]
pub struct ModuleEnhancer<'p> {
    parser: &'p dyn ModuleParser,
}

impl<'p> ModuleEnhancer<'p> {
    pub fn new(parser: &'p dyn ModuleParser) -> Self {
        ModuleEnhancer { parser }
    }

    /// Only source nodes the parser understands are enhanced.
    pub fn can_enhance(&self, node: &DependencyNode) -> bool {
        node.node_type == NodeType::Source && self.parser.supports(&node.path)
    }

    /// Parse the node's file and return the enhanced node. The input node is
    /// never modified.
    pub fn enhance(&self, node: &DependencyNode) -> Result<DependencyNode, EnhancementError> {
        let surface = self
            .parser
            .parse(&node.path)
            .map_err(|source| EnhancementError {
                path: node.path.clone(),
                source,
            })?;

        if surface.api_surface_changed {
            tracing::debug!("API surface changed in {}", node.path);
        }
        Ok(node.with_surface(surface))
    }

    /// Like [`enhance`](Self::enhance), but falls back to an unchanged copy of
    /// the node and hands the error back for reporting.
    pub fn enhance_or_keep(
        &self,
        node: &DependencyNode,
    ) -> (DependencyNode, Option<EnhancementError>) {
        match self.enhance(node) {
            Ok(enhanced) => (enhanced, None),
            Err(err) => {
                tracing::warn!("{}", err);
                (node.clone(), Some(err))
            }
        }
    }
}
