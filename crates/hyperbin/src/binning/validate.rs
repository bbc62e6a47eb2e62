//! Structural checks for hierarchical binnings.

use thiserror::Error;

use super::HierarchicalBinning;

// ============================================================================
// HierarchyError
// ============================================================================

/// Structural problems in the link graph of a hierarchical binning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// A link points past the last volume.
    #[error("volume {volume} links to volume {child}, but there are only {n_volumes} volumes")]
    LinkOutOfBounds {
        volume: usize,
        child: usize,
        n_volumes: usize,
    },
    /// A primary index points past the last volume.
    #[error("primary volume {primary} does not exist ({n_volumes} volumes)")]
    PrimaryOutOfBounds { primary: usize, n_volumes: usize },
    /// A volume links to itself.
    #[error("volume {volume} links to itself")]
    SelfLink { volume: usize },
    /// Following links from a volume leads back to it.
    #[error("link cycle through volume {volume}")]
    CycleDetected { volume: usize },
}

const UNVISITED: u8 = 0;
const VISITING: u8 = 1;
const DONE: u8 = 2;

/// Check that every link and primary index exists and that the link graph is
/// acyclic.
///
/// Volumes reachable along several paths are allowed; only cycles are
/// rejected.
pub(super) fn check_hierarchy<H>(binning: &H) -> Result<(), HierarchyError>
where
    H: HierarchicalBinning + ?Sized,
{
    let n_volumes = binning.n_volumes();

    for primary in (0..binning.n_primaries()).filter_map(|i| binning.primary(i)) {
        if primary >= n_volumes {
            return Err(HierarchyError::PrimaryOutOfBounds { primary, n_volumes });
        }
    }

    // Iterative DFS with colour marking, started from every volume so that
    // cycles unreachable from any root are found as well.
    let mut colour = vec![UNVISITED; n_volumes];
    let mut stack: Vec<(usize, bool)> = Vec::new();

    for root in 0..n_volumes {
        if colour[root] != UNVISITED {
            continue;
        }
        stack.push((root, false));

        while let Some((volume, leaving)) = stack.pop() {
            if leaving {
                colour[volume] = DONE;
                continue;
            }
            match colour[volume] {
                UNVISITED => {}
                VISITING => return Err(HierarchyError::CycleDetected { volume }),
                _ => continue,
            }

            colour[volume] = VISITING;
            stack.push((volume, true));

            let links = binning.links(volume).unwrap_or_default();
            for &child in links.iter().rev() {
                if child == volume {
                    return Err(HierarchyError::SelfLink { volume });
                }
                if child >= n_volumes {
                    return Err(HierarchyError::LinkOutOfBounds {
                        volume,
                        child,
                        n_volumes,
                    });
                }
                match colour[child] {
                    VISITING => return Err(HierarchyError::CycleDetected { volume: child }),
                    UNVISITED => stack.push((child, false)),
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
