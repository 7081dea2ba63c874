pub mod conll;
pub mod corenlp;
pub mod markup;
pub mod traits;

pub use corenlp::CoreNlpAnnotator;
pub use traits::Annotator;
