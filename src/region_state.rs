//! Per-region presentation state
//!
//! Renderers animate regions (raise the selected country, highlight on
//! hover). The state lives in caller-owned arrays sized to the dataset, one
//! slot per region index.

/// Struct-of-arrays state, one slot per region
///
/// Both arrays always have the same length; they only change size together
/// through [`RegionStates::resize`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionStates {
    /// Current extra elevation of each region, in world units
    elevation: Vec<f32>,
    /// Selection flag of each region
    selected: Vec<bool>,
}

impl RegionStates {
    /// State for `count` regions, all lowered and unselected
    pub fn new(count: usize) -> Self {
        Self {
            elevation: vec![0.0; count],
            selected: vec![false; count],
        }
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether there are no regions
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Grow or shrink to `count` regions; new slots start lowered and unselected
    pub fn resize(&mut self, count: usize) {
        self.elevation.resize(count, 0.0);
        self.selected.resize(count, false);
    }

    /// Elevations of all regions, indexed by region
    pub fn elevations(&self) -> &[f32] {
        &self.elevation
    }

    /// Selection flags of all regions, indexed by region
    pub fn selection(&self) -> &[bool] {
        &self.selected
    }

    /// Elevation of a region, `None` if out of range
    pub fn elevation(&self, region: usize) -> Option<f32> {
        self.elevation.get(region).copied()
    }

    /// Set a region's elevation; returns `false` if out of range
    pub fn set_elevation(&mut self, region: usize, value: f32) -> bool {
        match self.elevation.get_mut(region) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Whether a region is selected; out-of-range regions are not
    pub fn is_selected(&self, region: usize) -> bool {
        self.selected.get(region).copied().unwrap_or(false)
    }

    /// Set a region's selection flag; returns `false` if out of range
    pub fn set_selected(&mut self, region: usize, selected: bool) -> bool {
        match self.selected.get_mut(region) {
            Some(slot) => {
                *slot = selected;
                true
            }
            None => false,
        }
    }

    /// Select exactly one region, clearing all others
    pub fn select_only(&mut self, region: usize) -> bool {
        if region >= self.selected.len() {
            return false;
        }
        self.clear_selection();
        self.selected[region] = true;
        true
    }

    /// Unselect every region
    pub fn clear_selection(&mut self) {
        self.selected.iter_mut().for_each(|s| *s = false);
    }

    /// Indices of selected regions, ascending
    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
    }

    /// Move every elevation toward its target by at most `speed * dt`
    ///
    /// Selected regions rise to `raised`, others sink to 0. Returns `true`
    /// while any region is still moving.
    pub fn animate(&mut self, dt: f32, raised: f32, speed: f32) -> bool {
        let max_step = (speed * dt).max(0.0);
        let mut moving = false;
        for (elevation, &selected) in self.elevation.iter_mut().zip(&self.selected) {
            let target = if selected { raised } else { 0.0 };
            let delta = target - *elevation;
            if delta.abs() <= max_step {
                *elevation = target;
            } else {
                *elevation += max_step.copysign(delta);
                moving = true;
            }
        }
        moving
    }
}
