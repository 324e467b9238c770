//! Local clustering coefficient and triangle counts.
//!
//! A high clustering coefficient marks a class whose neighbors also
//! reference each other, a tightly tangled group. Computed over the
//! undirected simplification.

/// Number of undirected edges between the neighbors of `id`, which equals
/// the number of triangles through `id`.
pub fn triangle_count(undirected: &[Vec<usize>], id: usize) -> usize {
    let neighbors = &undirected[id];
    let mut links = 0;
    for (i, &a) in neighbors.iter().enumerate() {
        for &b in &neighbors[i + 1..] {
            // Neighbor lists are sorted.
            if undirected[a].binary_search(&b).is_ok() {
                links += 1;
            }
        }
    }
    links
}

/// Local clustering coefficient of `id`: realized neighbor links over
/// possible neighbor pairs. `0.0` for fewer than two neighbors.
pub fn clustering_coefficient(undirected: &[Vec<usize>], id: usize) -> f64 {
    let k = undirected[id].len();
    if k < 2 {
        return 0.0;
    }
    let possible = k * (k - 1) / 2;
    triangle_count(undirected, id) as f64 / possible as f64
}
