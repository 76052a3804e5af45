pub mod analyze;
pub mod combos;
pub mod files;
pub mod normalize;

pub use analyze::{analyze, simple_word_list, DimensionBreakdown, DiversityReport};
pub use combos::{create_prompt_batch, existing_combinations, CombinationGenerator};
pub use files::{
    batch_file_name, list_batch_files, load_batches, load_word_entries, next_batch_index,
    write_batch, write_batches, CandidateBatch, LoadedBatches, RawRecord, TagValue,
};
pub use normalize::{normalize, NormalizeReport, NormalizeRules};
