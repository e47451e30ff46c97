pub mod amplicon;
