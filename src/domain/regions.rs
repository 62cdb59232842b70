//! Static region partition of the element index space.
//!
//! Regions stand in for materials: they carry no physics of their own but
//! let the EOS stage run region-by-region with optionally replicated work,
//! the way a real multi-material code pays different costs per material.
//! The assignment is pseudo-random with a fixed run-length histogram and a
//! rank-seeded generator, so it is reproducible for a given rank count but
//! not across rank counts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Disjoint element sets, region numbers 1..=R.
#[derive(Debug, Clone)]
pub struct RegionPartition {
    pub num_regions: usize,
    /// Region number (1-based) per element
    pub region_of: Vec<usize>,
    /// Element index set per region (0-based region index)
    pub elem_lists: Vec<Vec<usize>>,
}

impl RegionPartition {
    /// Partition `num_elem` elements into `num_regions` regions.
    ///
    /// Region weights follow (r+1)^balance, so a larger balance exponent
    /// skews element counts toward high-numbered regions. Regions are
    /// rotated by rank so each rank sees a different dominant region, and
    /// the same region is never drawn twice in a row. Elements are assigned
    /// in runs whose lengths are drawn from a fixed bucket histogram
    /// (mostly short runs, occasionally very long ones).
    pub fn build(num_elem: usize, num_regions: usize, balance: u32, rank: usize) -> Self {
        assert!(num_regions >= 1, "at least one region is required");

        let mut region_of = vec![0usize; num_elem];

        if num_regions == 1 {
            region_of.iter_mut().for_each(|r| *r = 1);
        } else {
            let mut rng = StdRng::seed_from_u64(rank as u64);

            // cumulative weights: chance of region i is proportional to (i+1)^balance
            let mut bin_end = Vec::with_capacity(num_regions);
            let mut denominator: i64 = 0;
            for i in 0..num_regions {
                denominator += (i as i64 + 1).pow(balance);
                bin_end.push(denominator);
            }

            let pick_region = |rng: &mut StdRng| -> usize {
                let var = rng.gen_range(0..denominator);
                let mut i = 0;
                while var >= bin_end[i] {
                    i += 1;
                }
                (i + rank) % num_regions + 1
            };

            let mut last_region = 0usize;
            let mut next_index = 0usize;
            while next_index < num_elem {
                let mut region = pick_region(&mut rng);
                while region == last_region {
                    region = pick_region(&mut rng);
                }

                // run length from the fixed bucket histogram
                let bin = rng.gen_range(0..1000);
                let run = if bin < 773 {
                    rng.gen_range(1..=15)
                } else if bin < 937 {
                    rng.gen_range(16..=31)
                } else if bin < 970 {
                    rng.gen_range(32..=63)
                } else if bin < 974 {
                    rng.gen_range(64..=127)
                } else if bin < 978 {
                    rng.gen_range(128..=255)
                } else if bin < 981 {
                    rng.gen_range(256..=511)
                } else {
                    rng.gen_range(512..=2048)
                };

                let run_to = (next_index + run).min(num_elem);
                region_of[next_index..run_to].iter_mut().for_each(|r| *r = region);
                next_index = run_to;
                last_region = region;
            }
        }

        let mut elem_lists = vec![Vec::new(); num_regions];
        for (elem, &r) in region_of.iter().enumerate() {
            elem_lists[r - 1].push(elem);
        }

        Self {
            num_regions,
            region_of,
            elem_lists,
        }
    }

    pub fn region_size(&self, region_index: usize) -> usize {
        self.elem_lists[region_index].len()
    }
}
