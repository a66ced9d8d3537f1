pub mod gaussian_region_blurrer;

mod gaussian;
