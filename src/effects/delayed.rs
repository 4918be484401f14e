//! Warheads with a configured delay

use super::render::{Renderable, ViewerContext};
use super::{Effect, TickContext};
use crate::geometry::WPos;
use crate::warheads::{ImpactTarget, WarheadArgs};

/// Fires one warhead of a weapon after a countdown.
#[derive(Debug, Clone)]
pub struct DelayedImpact {
    remaining: u32,
    warhead: usize,
    target: ImpactTarget,
    args: WarheadArgs,
}

impl DelayedImpact {
    pub fn new(delay: u32, warhead: usize, target: ImpactTarget, args: WarheadArgs) -> Self {
        Self {
            remaining: delay,
            warhead,
            target,
            args,
        }
    }
}

impl Effect for DelayedImpact {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return;
        }

        ctx.remove_self();
        if let Some(warhead) = self.args.weapon.warheads.get(self.warhead) {
            warhead.do_impact(ctx, &self.target, &self.args);
        }
    }

    fn render<'a>(&'a self, _viewer: &'a ViewerContext) -> Box<dyn Iterator<Item = Renderable> + 'a> {
        Box::new(std::iter::empty())
    }

    fn kind(&self) -> &'static str {
        "delayed-impact"
    }

    fn sync_position(&self) -> Option<WPos> {
        Some(self.args.impact_position)
    }
}
