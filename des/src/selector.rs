use rand::RngCore;
use rand::seq::IndexedRandom;

use crate::line::BoundedLine;

/// Picks which line an arriving customer should try to join.
///
/// The choice is advisory: sizes are observed before admission is attempted,
/// so the chosen line may fill up in between. Callers treat that as an
/// ordinary failed admission.
pub trait LineSelector: Send + Sync {
    fn select(&self, lines: &[BoundedLine], rng: &mut dyn RngCore) -> Option<usize>;
}

/// Always the first line. Used when there is only one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleLine;

impl LineSelector for SingleLine {
    fn select(&self, lines: &[BoundedLine], _rng: &mut dyn RngCore) -> Option<usize> {
        if lines.is_empty() { None } else { Some(0) }
    }
}

/// Shortest non-full line, ties broken uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestLine;

impl ShortestLine {
    /// Indices of the non-full lines sharing the smallest observed size.
    pub fn candidates(lines: &[BoundedLine]) -> Vec<usize> {
        let mut shortest = Vec::new();
        let mut min_size = usize::MAX;

        for (i, line) in lines.iter().enumerate() {
            let size = line.size();
            if size >= line.capacity() {
                continue;
            }
            if size < min_size {
                min_size = size;
                shortest.clear();
                shortest.push(i);
            } else if size == min_size {
                shortest.push(i);
            }
        }
        shortest
    }
}

impl LineSelector for ShortestLine {
    fn select(&self, lines: &[BoundedLine], rng: &mut dyn RngCore) -> Option<usize> {
        ShortestLine::candidates(lines).choose(rng).copied()
    }
}

/// Identity selector for a single line, shortest-line balancing otherwise.
pub fn selector_for(line_count: usize) -> Box<dyn LineSelector> {
    if line_count <= 1 {
        Box::new(SingleLine)
    } else {
        Box::new(ShortestLine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::Customer;

    fn lines_with_sizes(capacity: usize, sizes: &[usize]) -> Vec<BoundedLine> {
        let mut next_id = 1;
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let line = BoundedLine::new(i, capacity);
                for _ in 0..size {
                    assert!(line.try_admit(Customer::new(next_id)));
                    next_id += 1;
                }
                line
            })
            .collect()
    }

    #[test]
    fn unique_minimum_is_always_chosen() {
        let lines = lines_with_sizes(4, &[2, 1, 3]);
        let mut rng = rand::rng();
        for _ in 0..200 {
            assert_eq!(ShortestLine.select(&lines, &mut rng), Some(1));
        }
    }

    #[test]
    fn full_lines_are_never_candidates() {
        let lines = lines_with_sizes(4, &[4, 3, 4]);
        assert_eq!(ShortestLine::candidates(&lines), vec![1]);
    }

    #[test]
    fn all_full_yields_none() {
        let lines = lines_with_sizes(2, &[2, 2, 2]);
        let mut rng = rand::rng();
        assert_eq!(ShortestLine.select(&lines, &mut rng), None);
    }

    #[test]
    fn ties_are_broken_evenly() {
        let lines = lines_with_sizes(4, &[1, 3, 1]);
        let mut rng = rand::rng();
        let mut counts = [0usize; 3];
        let trials = 4000;
        for _ in 0..trials {
            let chosen = ShortestLine.select(&lines, &mut rng).unwrap();
            counts[chosen] += 1;
        }

        assert_eq!(counts[1], 0);
        assert_eq!(counts[0] + counts[2], trials);
        // each side should be near 2000; 1700 is far outside binomial noise
        assert!(counts[0] > 1700, "line 1 picked {} times", counts[0]);
        assert!(counts[2] > 1700, "line 3 picked {} times", counts[2]);
    }

    #[test]
    fn single_line_selector_ignores_size() {
        let lines = lines_with_sizes(1, &[1]);
        let mut rng = rand::rng();
        assert_eq!(SingleLine.select(&lines, &mut rng), Some(0));
        assert_eq!(SingleLine.select(&[], &mut rng), None);
    }
}
