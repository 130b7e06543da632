/// Improvements smaller than this are float noise, not shorter paths.
const EPSILON: f64 = 1e-12;

/// 2-opt over an open path. Scans index pairs `(i, j)`; when reversing
/// `path[i + 1..=j]` strictly shortens the two replaced edges, reverses and
/// restarts the scan. Stops after a full scan without improvement and
/// returns the number of reversals made.
pub fn two_opt(path: &mut [usize], dist: impl Fn(usize, usize) -> f64) -> usize {
    let n = path.len();
    let mut reversals = 0;
    if n < 4 {
        return reversals;
    }
    'restart: loop {
        for i in 0..n - 3 {
            for j in i + 2..n - 1 {
                let before = dist(path[i], path[i + 1]) + dist(path[j], path[j + 1]);
                let after = dist(path[i], path[j]) + dist(path[i + 1], path[j + 1]);
                if after < before - EPSILON {
                    path[i + 1..=j].reverse();
                    reversals += 1;
                    continue 'restart;
                }
            }
        }
        return reversals;
    }
}
