//! Pure space distribution across a sequence of constrained items.
//!
//! Two modes exist. Proportional distribution ([`distribute`]) is used
//! whenever a container is laid out or resized: every item scales with its
//! stored proportional share and clamp overflow is passed to the next
//! resizable neighbour, scanning left to right. Fixed-mode separator drags
//! ([`drag_separator`]) touch only the two items adjacent to the separator.

use tracing::warn;

const EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeConstraints {
    pub minimum: f64,
    pub maximum: f64,
    /// Sizes dragged below this threshold collapse to the minimum.
    pub snap: Option<f64>,
}

impl Default for SizeConstraints {
    fn default() -> Self {
        SizeConstraints {
            minimum: 0.0,
            maximum: f64::INFINITY,
            snap: None,
        }
    }
}

impl SizeConstraints {
    pub fn new(minimum: f64, maximum: f64) -> Self {
        SizeConstraints { minimum, maximum, snap: None }
    }

    pub fn clamp(&self, size: f64) -> f64 { size.max(self.minimum).min(self.maximum) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SizedItem {
    pub size: f64,
    /// Share of the distributable extent this item held after the last
    /// distribution. Recomputed by every call to [`distribute`].
    pub proportional_share: f64,
    pub constraints: SizeConstraints,
}

impl SizedItem {
    pub fn new(size: f64, constraints: SizeConstraints) -> Self {
        SizedItem { size, proportional_share: 0.0, constraints }
    }
}

/// Distributes `available` minus separators across `items`.
///
/// Feasible inputs (`sum(min) <= content <= sum(max)`) come out summing to
/// exactly the content extent with every size inside its bounds. Infeasible
/// inputs pin every item to a bound and tolerate the overflow; sizes are
/// never negative.
///
/// Items whose sizes already satisfy the target are left bit-for-bit
/// untouched, so a redundant layout pass cannot drift sizes.
pub fn distribute(items: &mut [SizedItem], available: f64, separator: f64) {
    let n = items.len();
    if n == 0 {
        return;
    }
    let content = (available - separator * (n - 1) as f64).max(0.0);

    let current: f64 = items.iter().map(|i| i.size).sum();
    let stable = (current - content).abs() <= EPSILON
        && items.iter().all(|i| {
            i.size >= i.constraints.minimum - EPSILON && i.size <= i.constraints.maximum + EPSILON
        });
    if stable {
        recompute_shares(items, content);
        return;
    }

    let minimum_sum: f64 = items.iter().map(|i| i.constraints.minimum).sum();
    if minimum_sum > content + EPSILON {
        warn!(minimum_sum, content, "infeasible extent; pinning items to minimums");
        for item in items.iter_mut() {
            item.size = item.constraints.minimum;
        }
        recompute_shares(items, content);
        return;
    }

    // Scale targets from the current sizes (authoritative after structural
    // edits), falling back to stored shares and finally to an even split.
    let share_sum: f64 = items.iter().map(|i| i.proportional_share).sum();
    let weights: Vec<f64> = if current > EPSILON {
        items.iter().map(|i| i.size / current).collect()
    } else if share_sum > EPSILON {
        items.iter().map(|i| i.proportional_share / share_sum).collect()
    } else {
        vec![1.0 / n as f64; n]
    };

    for (item, weight) in items.iter_mut().zip(&weights) {
        item.size = item.constraints.clamp(weight * content);
    }

    // Hand the clamp leftover (or deficit) to the next resizable item,
    // left-to-right, until stable or no capacity remains.
    let mut leftover = content - items.iter().map(|i| i.size).sum::<f64>();
    while leftover.abs() > EPSILON {
        let before = leftover;
        for item in items.iter_mut() {
            if leftover > EPSILON {
                let room = item.constraints.maximum - item.size;
                let take = leftover.min(room);
                if take > 0.0 {
                    item.size += take;
                    leftover -= take;
                }
            } else if leftover < -EPSILON {
                let room = item.size - item.constraints.minimum;
                let give = (-leftover).min(room);
                if give > 0.0 {
                    item.size -= give;
                    leftover += give;
                }
            }
        }
        if (leftover - before).abs() <= EPSILON {
            break;
        }
    }

    recompute_shares(items, content);
}

/// Fixed-mode separator drag: only `items[index]` and `items[index + 1]`
/// absorb the delta. Returns the delta actually applied after clamping.
pub fn drag_separator(items: &mut [SizedItem], index: usize, delta: f64) -> f64 {
    if index + 1 >= items.len() {
        return 0.0;
    }
    let (left, right) = (items[index], items[index + 1]);

    let applied = if delta >= 0.0 {
        delta
            .min(left.constraints.maximum - left.size)
            .min(right.size - right.constraints.minimum)
            .max(0.0)
    } else {
        -((-delta)
            .min(left.size - left.constraints.minimum)
            .min(right.constraints.maximum - right.size)
            .max(0.0))
    };

    let mut new_left = left.size + applied;
    let mut new_right = right.size - applied;
    let total = left.size + right.size;

    // Snap the shrinking side closed once it falls under its snap threshold,
    // provided the growing side can absorb the difference.
    if applied < 0.0
        && let Some(snap) = left.constraints.snap
        && new_left < snap
    {
        let collapsed = left.constraints.minimum;
        let grown = total - collapsed;
        if grown <= right.constraints.maximum {
            new_left = collapsed;
            new_right = grown;
        }
    } else if applied > 0.0
        && let Some(snap) = right.constraints.snap
        && new_right < snap
    {
        let collapsed = right.constraints.minimum;
        let grown = total - collapsed;
        if grown <= left.constraints.maximum {
            new_right = collapsed;
            new_left = grown;
        }
    }

    items[index].size = new_left;
    items[index + 1].size = new_right;

    let content: f64 = items.iter().map(|i| i.size).sum();
    recompute_shares(items, content);
    new_left - left.size
}

fn recompute_shares(items: &mut [SizedItem], content: f64) {
    if content > EPSILON {
        for item in items.iter_mut() {
            item.proportional_share = item.size / content;
        }
    } else {
        let n = items.len().max(1) as f64;
        for item in items.iter_mut() {
            item.proportional_share = 1.0 / n;
        }
    }
}
