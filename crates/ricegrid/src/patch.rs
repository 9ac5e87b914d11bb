/// Date used in file names when the job has none.
pub const DEFAULT_DATE: &str = "00000000";

/// A square tile inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRect {
    /// Position in row-major order inside the cell, starting at 1.
    pub number: usize,
    /// Left edge relative to the cell.
    pub x: usize,
    /// Top edge relative to the cell.
    pub y: usize,
    /// Side length.
    pub size: usize,
}

/// Whole `patch_size x patch_size` tiles of a `width x height` cell.
///
/// Tiles start at the top left corner and step by `patch_size`; the remainder on the
/// right and bottom is dropped. A cell smaller than a patch yields nothing.
///
/// # Example
///
/// ```
/// use ricegrid::patch::patch_grid;
///
/// let patches = patch_grid(250, 120, 100).collect::<Vec<_>>();
/// assert_eq!(patches.len(), 2);
/// assert_eq!((patches[1].number, patches[1].x, patches[1].y), (2, 100, 0));
/// ```
pub fn patch_grid(
    width: usize,
    height: usize,
    patch_size: usize,
) -> impl Iterator<Item = PatchRect> {
    let (nx, ny) = match patch_size {
        0 => (0, 0),
        ps => (width / ps, height / ps),
    };

    (0..ny).flat_map(move |row| {
        (0..nx).map(move |col| PatchRect {
            number: row * nx + col + 1,
            x: col * patch_size,
            y: row * patch_size,
            size: patch_size,
        })
    })
}

/// Identity of a patch within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchKey<'a> {
    /// Date tag of the job.
    pub date: &'a str,
    /// Cluster number of the cell the patch belongs to.
    pub cluster_number: i64,
    /// Number of the patch inside its cell, starting at 1.
    pub patch_number: usize,
}

/// Strategy that turns a [`PatchKey`] into a file name.
///
/// The extension of the returned name selects the encoder. Names must be unique per
/// key so that cells can be written concurrently.
///
/// Closures are strategies too:
///
/// ```
/// use ricegrid::patch::{PatchKey, PatchNaming};
///
/// let naming = |key: &PatchKey| format!("c{}-p{}.png", key.cluster_number, key.patch_number);
/// let key = PatchKey { date: "20240101", cluster_number: 7, patch_number: 2 };
/// assert_eq!(naming.file_name(&key), "c7-p2.png");
/// ```
pub trait PatchNaming: Send + Sync {
    /// File name of the patch, without directory.
    fn file_name(&self, key: &PatchKey) -> String;
}

impl<F> PatchNaming for F
where
    F: Fn(&PatchKey) -> String + Send + Sync,
{
    fn file_name(&self, key: &PatchKey) -> String {
        self(key)
    }
}

/// `{date}_{cluster:03}_{patch:04}.png`, the default naming.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatedNaming;

impl PatchNaming for DatedNaming {
    fn file_name(&self, key: &PatchKey) -> String {
        let date = if key.date.is_empty() {
            DEFAULT_DATE
        } else {
            key.date
        };
        format!(
            "{}_{:03}_{:04}.png",
            date, key.cluster_number, key.patch_number
        )
    }
}

/// `{cluster}번군락_{patch}번이미지.tif`, the naming of earlier releases.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterNaming;

impl PatchNaming for ClusterNaming {
    fn file_name(&self, key: &PatchKey) -> String {
        format!("{}번군락_{}번이미지.tif", key.cluster_number, key.patch_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_counts() {
        for (w, h, ps, expected) in [
            (50, 50, 50, 1),
            (99, 200, 50, 4),
            (149, 251, 50, 10),
            (100, 100, 50, 4),
            (49, 500, 50, 0),
            (500, 49, 50, 0),
            (320, 215, 100, 6),
            (10, 10, 0, 0),
        ] {
            assert_eq!(patch_grid(w, h, ps).count(), expected, "{w}x{h} / {ps}");
        }
    }

    #[test]
    fn patches_row_major() {
        let patches = patch_grid(30, 20, 10).collect::<Vec<_>>();
        let positions = patches.iter().map(|p| (p.number, p.x, p.y)).collect::<Vec<_>>();
        assert_eq!(
            positions,
            vec![
                (1, 0, 0),
                (2, 10, 0),
                (3, 20, 0),
                (4, 0, 10),
                (5, 10, 10),
                (6, 20, 10)
            ]
        );
    }

    #[test]
    fn dated_naming() {
        let key = PatchKey {
            date: "20240517",
            cluster_number: 7,
            patch_number: 12,
        };
        assert_eq!(DatedNaming.file_name(&key), "20240517_007_0012.png");

        let key = PatchKey {
            date: "",
            cluster_number: 1234,
            patch_number: 1,
        };
        assert_eq!(DatedNaming.file_name(&key), "00000000_1234_0001.png");
    }

    #[test]
    fn cluster_naming() {
        let key = PatchKey {
            date: "20240517",
            cluster_number: 3,
            patch_number: 10,
        };
        assert_eq!(ClusterNaming.file_name(&key), "3번군락_10번이미지.tif");
    }

    #[test]
    fn boxed_strategies() {
        let strategies: Vec<Box<dyn PatchNaming>> = vec![
            Box::new(DatedNaming),
            Box::new(ClusterNaming),
            Box::new(|key: &PatchKey| format!("{}.tiff", key.patch_number)),
        ];
        let key = PatchKey {
            date: "x",
            cluster_number: 1,
            patch_number: 1,
        };
        let names = strategies
            .iter()
            .map(|s| s.file_name(&key))
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["x_001_0001.png", "1번군락_1번이미지.tif", "1.tiff"]);
    }
}
