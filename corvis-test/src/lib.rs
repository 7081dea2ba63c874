// Integration test utilities and fixtures for corvis.

use std::path::{Path, PathBuf};

use corvis_core::config::CorvisConfig;

/// CoreNLP output for "Barack Obama visited Paris. He liked the city."
pub const OBAMA_JSON: &str = r#"{
  "docId": "obama.txt",
  "sentences": [
    {"index": 0, "tokens": [
      {"index": 1, "word": "Barack", "lemma": "Barack", "pos": "NNP", "ner": "PERSON", "speaker": "PER0"},
      {"index": 2, "word": "Obama", "lemma": "Obama", "pos": "NNP", "ner": "PERSON", "speaker": "PER0"},
      {"index": 3, "word": "visited", "lemma": "visit", "pos": "VBD", "ner": "O", "speaker": "PER0"},
      {"index": 4, "word": "Paris", "lemma": "Paris", "pos": "NNP", "ner": "LOCATION", "speaker": "PER0"},
      {"index": 5, "word": ".", "lemma": ".", "pos": ".", "ner": "O", "speaker": "PER0"}
    ]},
    {"index": 1, "tokens": [
      {"index": 1, "word": "He", "lemma": "he", "pos": "PRP", "ner": "O", "speaker": "PER0"},
      {"index": 2, "word": "liked", "lemma": "like", "pos": "VBD", "ner": "O", "speaker": "PER0"},
      {"index": 3, "word": "the", "lemma": "the", "pos": "DT", "ner": "O", "speaker": "PER0"},
      {"index": 4, "word": "city", "lemma": "city", "pos": "NN", "ner": "O", "speaker": "PER0"},
      {"index": 5, "word": ".", "lemma": ".", "pos": ".", "ner": "O", "speaker": "PER0"}
    ]}
  ],
  "corefs": {
    "1": [
      {"id": 1, "text": "Barack Obama", "type": "PROPER", "number": "SINGULAR", "gender": "MALE", "animacy": "ANIMATE", "startIndex": 1, "endIndex": 3, "headIndex": 2, "sentNum": 1, "position": [1, 1], "isRepresentativeMention": true},
      {"id": 3, "text": "He", "type": "PRONOMINAL", "number": "SINGULAR", "gender": "MALE", "animacy": "ANIMATE", "startIndex": 1, "endIndex": 2, "headIndex": 1, "sentNum": 2, "position": [2, 1], "isRepresentativeMention": false}
    ],
    "2": [
      {"id": 2, "text": "Paris", "type": "PROPER", "number": "SINGULAR", "gender": "NEUTRAL", "animacy": "INANIMATE", "startIndex": 4, "endIndex": 5, "headIndex": 4, "sentNum": 1, "position": [1, 2], "isRepresentativeMention": true},
      {"id": 4, "text": "the city", "type": "NOMINAL", "number": "SINGULAR", "gender": "NEUTRAL", "animacy": "INANIMATE", "startIndex": 3, "endIndex": 5, "headIndex": 4, "sentNum": 2, "position": [2, 2], "isRepresentativeMention": false}
    ]
  }
}"#;

/// Reference annotation: "Obama" and "He" corefer, as do "Paris" and
/// "the city"; "Michelle" is a separate entity.
pub const REFERENCE_CONLL: &str = "\
#begin document (news/obama); part 000
news/obama 0 0 Obama NNP (TOP(S(NP*) - - - PER0 (PERSON) (1)
news/obama 0 1 met VBD (VP* meet - - PER0 * -
news/obama 0 2 Michelle NNP (NP*) - - - PER0 (PERSON) (3)
news/obama 0 3 in IN (PP* - - - PER0 * -
news/obama 0 4 Paris NNP (NP*)))) - - - PER0 (GPE) (2)
news/obama 0 5 . . *)) - - - PER0 * -

news/obama 0 0 He PRP (TOP(S(NP*) - - - PER0 * (1)
news/obama 0 1 loved VBD (VP* love - - PER0 * -
news/obama 0 2 the DT (NP* - - - PER0 * (2
news/obama 0 3 city NN *))) - - - PER0 * 2)
news/obama 0 4 . . *)) - - - PER0 * -
#end document
";

/// System output that links "He" to "Michelle" and misses "the city".
pub const SYSTEM_CONLL: &str = "\
#begin document (news/obama); part 000
news/obama 0 0 Obama NNP (TOP(S(NP*) - - - PER0 (PERSON) (1)
news/obama 0 1 met VBD (VP* meet - - PER0 * -
news/obama 0 2 Michelle NNP (NP*) - - - PER0 (PERSON) (3)
news/obama 0 3 in IN (PP* - - - PER0 * -
news/obama 0 4 Paris NNP (NP*)))) - - - PER0 (GPE) (2)
news/obama 0 5 . . *)) - - - PER0 * -

news/obama 0 0 He PRP (TOP(S(NP*) - - - PER0 * (3)
news/obama 0 1 loved VBD (VP* love - - PER0 * -
news/obama 0 2 the DT (NP* - - - PER0 * (4
news/obama 0 3 city NN *))) - - - PER0 * 4)
news/obama 0 4 . . *)) - - - PER0 * -
#end document
";

/// A temporary CoreNLP stand-in: an installation directory plus a launcher
/// script that answers every request with a fixed JSON document.
#[derive(Debug)]
pub struct FakeCoreNlp {
    pub dir: tempfile::TempDir,
}

impl FakeCoreNlp {
    /// Launcher that copies `json` to `<outputDirectory>/<file name>.json`.
    #[cfg(unix)]
    pub fn answering(json: &str) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let fixture = dir.path().join("answer.json");
        std::fs::write(&fixture, json).expect("write fixture");
        let script = format!(
            "#!/bin/sh\n\
             out=''\n\
             file=''\n\
             while [ $# -gt 0 ]; do\n\
             \x20 case \"$1\" in\n\
             \x20   -outputDirectory) out=\"$2\"; shift ;;\n\
             \x20   -file) file=\"$2\"; shift ;;\n\
             \x20 esac\n\
             \x20 shift\n\
             done\n\
             cp '{}' \"$out/$(basename \"$file\").json\"\n",
            fixture.display()
        );
        write_executable(&dir.path().join("java"), &script);
        Self { dir }
    }

    /// Launcher that prints to stderr and exits with status 3.
    #[cfg(unix)]
    pub fn failing() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        write_executable(
            &dir.path().join("java"),
            "#!/bin/sh\necho 'Exception in thread \"main\" java.lang.OutOfMemoryError' >&2\nexit 3\n",
        );
        Self { dir }
    }

    /// Launcher that never finishes on its own.
    #[cfg(unix)]
    pub fn hanging() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        write_executable(&dir.path().join("java"), "#!/bin/sh\nexec sleep 30\n");
        Self { dir }
    }

    /// Installation directory to hand to the pipeline.
    pub fn location(&self) -> &Path {
        self.dir.path()
    }

    pub fn launcher(&self) -> PathBuf {
        self.dir.path().join("java")
    }

    /// Configuration that launches this fake instead of `java`, writing
    /// visualizations under `output_dir`.
    pub fn config(&self, output_dir: &Path) -> CorvisConfig {
        let mut config = CorvisConfig::default();
        config.annotator.java = self.launcher().display().to_string();
        config.render.output_dir = output_dir.to_path_buf();
        config
    }
}

#[cfg(unix)]
fn write_executable(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, content).expect("write script");
    let mut permissions = std::fs::metadata(path).expect("stat script").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path, permissions).expect("chmod script");
}

/// Write `text` to `name` inside `dir` and return the path.
pub fn write_input(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write input");
    path
}
