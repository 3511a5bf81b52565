// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use tracing::debug;

use super::traits::RenderSurface;

/// Owns a surface for a scope and releases it when dropped, on every exit
/// path including early returns and unwinding.
pub struct SurfaceGuard {
    surface: Box<dyn RenderSurface>,
}

impl SurfaceGuard {
    pub fn new(surface: Box<dyn RenderSurface>) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &dyn RenderSurface {
        self.surface.as_ref()
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        self.surface.release();
        debug!("render surface released");
    }
}
