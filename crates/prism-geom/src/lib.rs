//! Reader for the prism geometry text format.
//!
//! This crate is intentionally dependency-free so that tools can read and
//! validate geometry files without pulling in any GPU code.
//!
//! # Format
//!
//! ```text
//! [points]
//! # x    y     r   g   b
//! -0.5 -0.5   1.0 0.0 0.0
//! +0.5 -0.5   0.0 1.0 0.0
//! +0.0 +0.5   0.0 0.0 1.0
//!
//! [indices]
//! 0 1 2
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use prism_geom::parse_str;
//!
//! let g = parse_str("[points]\n0 0 1 1 1\n1 0 1 1 1\n0 1 1 1 1\n[indices]\n0 1 2\n").unwrap();
//! assert_eq!(g.points.len(), 15);
//! assert_eq!(g.indices, vec![0, 1, 2]);
//! ```

pub mod error;
pub mod geometry;
pub mod reader;

pub use error::{LoadError, ParseError};
pub use geometry::{Geometry, POINT_COMPONENTS, TRIANGLE_CORNERS};
pub use reader::{load_file, parse_str};
