pub mod bwt;
pub mod count;
pub mod fm;
pub mod occ;
pub mod record;
pub mod sa;
