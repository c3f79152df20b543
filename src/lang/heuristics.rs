//! LangHeuristics: lexical scoring of text windows against stopword and
//! diacritic tables, used to correct mislabels from the acoustic model.
//!
//! Tables ported from the product's language-detection module; stopwords and
//! diacritics are only defined for the ten languages with enough lexical
//! signal to be useful (`en es fr de it pt pl nl ru cs`). Every other
//! supported code carries an empty table and therefore never wins a
//! heuristic vote — its acoustic label is trusted as-is.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// One language's lexical evidence.
pub struct LangEntry {
    pub name: &'static str,
    pub stopwords: &'static [&'static str],
    pub diacritics: &'static str,
}

/// Process-wide constant: `language_code -> {stopwords, diacritics}`.
pub struct LanguageHeuristicTable(HashMap<&'static str, LangEntry>);

impl LanguageHeuristicTable {
    pub fn get(&self, code: &str) -> Option<&LangEntry> {
        self.0.get(code)
    }

    pub fn language_name(&self, code: &str) -> &'static str {
        self.0.get(code).map(|e| e.name).unwrap_or("Unknown")
    }

    /// Codes that carry lexical evidence (the ten with stopword/diacritic tables).
    pub fn lexical_codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().filter(|(_, e)| !e.stopwords.is_empty()).map(|(k, _)| *k)
    }
}

static TABLE: OnceLock<LanguageHeuristicTable> = OnceLock::new();

pub fn table() -> &'static LanguageHeuristicTable {
    TABLE.get_or_init(build_table)
}

fn build_table() -> LanguageHeuristicTable {
    let mut m = HashMap::new();
    macro_rules! lang {
        ($code:expr, $name:expr, $stopwords:expr, $diacritics:expr) => {
            m.insert(
                $code,
                LangEntry { name: $name, stopwords: $stopwords, diacritics: $diacritics },
            );
        };
    }

    lang!("en", "English", &EN_STOPWORDS, "");
    lang!("es", "Spanish", &ES_STOPWORDS, "áéíóúüñÁÉÍÓÚÜÑ");
    lang!("fr", "French", &FR_STOPWORDS, "àâäéèêëîïôöùûüÿçÀÂÄÉÈÊËÎÏÔÖÙÛÜŸÇ");
    lang!("de", "German", &DE_STOPWORDS, "äöüßÄÖÜ");
    lang!("it", "Italian", &IT_STOPWORDS, "àèéìîòóùÀÈÉÌÎÒÓÙ");
    lang!("pt", "Portuguese", &PT_STOPWORDS, "áâãàçéêíóôõúÁÂÃÀÇÉÊÍÓÔÕÚ");
    lang!("pl", "Polish", &PL_STOPWORDS, "ąćęłńóśźżĄĆĘŁŃÓŚŹŻ");
    lang!("nl", "Dutch", &NL_STOPWORDS, "éèëïöüÉÈËÏÖÜ");
    lang!("ru", "Russian", &RU_STOPWORDS, "");
    lang!("zh", "Chinese", &[] as &[&str], "");
    lang!("ja", "Japanese", &[] as &[&str], "");
    lang!("ko", "Korean", &[] as &[&str], "");
    lang!("ar", "Arabic", &[] as &[&str], "");
    lang!("he", "Hebrew", &[] as &[&str], "");
    lang!("th", "Thai", &[] as &[&str], "");
    lang!("vi", "Vietnamese", &[] as &[&str], "");
    lang!("tr", "Turkish", &[] as &[&str], "");
    lang!("cs", "Czech", &CS_STOPWORDS, "áéíóúůýčďěňřšťžÁÉÍÓÚŮÝČĎĚŇŘŠŤŽ");
    lang!("ro", "Romanian", &[] as &[&str], "");
    lang!("sv", "Swedish", &[] as &[&str], "");
    lang!("da", "Danish", &[] as &[&str], "");
    lang!("no", "Norwegian", &[] as &[&str], "");
    lang!("fi", "Finnish", &[] as &[&str], "");
    lang!("el", "Greek", &[] as &[&str], "");
    lang!("hi", "Hindi", &[] as &[&str], "");
    lang!("id", "Indonesian", &[] as &[&str], "");
    lang!("uk", "Ukrainian", &[] as &[&str], "");
    lang!("unknown", "Unknown", &[] as &[&str], "");

    LanguageHeuristicTable(m)
}

static EN_STOPWORDS: [&str; 46] = [
    "the", "and", "is", "are", "to", "of", "in", "that", "for", "you", "it", "on", "with", "this",
    "be", "have", "at", "or", "as", "i", "we", "they", "was", "were", "will", "would", "can",
    "could", "a", "an", "from", "by", "about", "what", "which", "who", "how", "do", "does", "did",
    "not", "if", "there", "their", "them", "our",
];
static ES_STOPWORDS: [&str; 71] = [
    "el", "la", "los", "las", "un", "una", "unos", "unas", "de", "y", "en", "a", "que", "por",
    "con", "para", "como", "es", "su", "al", "lo", "se", "del", "más", "pero", "sus", "le", "ya",
    "o", "este", "sí", "porque", "esta", "entre", "cuando", "muy", "sin", "sobre", "también",
    "me", "hasta", "hay", "donde", "quien", "desde", "todo", "nos", "durante", "todos", "uno",
    "les", "ni", "contra", "otros", "ese", "eso", "ante", "ellos", "e", "esto", "mí", "antes",
    "algunos", "qué", "yo", "otro", "otras", "otra", "unos", "unas", "del", "al",
];
static FR_STOPWORDS: [&str; 40] = [
    "le", "la", "les", "un", "une", "des", "du", "de", "et", "en", "à", "que", "il", "elle",
    "nous", "vous", "ils", "elles", "au", "aux", "avec", "par", "sur", "pas", "plus", "mais",
    "ou", "comme", "son", "sa", "ses", "leur", "leurs", "est", "sont", "été", "être", "a", "ont",
    "avait",
];
static DE_STOPWORDS: [&str; 44] = [
    "der", "die", "das", "ein", "eine", "eines", "einer", "einem", "den", "dem", "des", "und",
    "zu", "mit", "auf", "für", "von", "im", "ist", "war", "wurde", "werden", "wie", "als", "auch",
    "an", "bei", "nach", "vor", "aus", "durch", "über", "unter", "zwischen", "gegen", "ohne",
    "um", "am", "aber", "nur", "noch", "schon", "man", "sein",
];
static IT_STOPWORDS: [&str; 40] = [
    "il", "lo", "la", "i", "gli", "le", "un", "una", "uno", "di", "a", "da", "in", "con", "su",
    "per", "tra", "fra", "che", "non", "più", "ma", "come", "se", "quando", "dove", "chi",
    "quale", "quelli", "questo", "questa", "questi", "queste", "sono", "era", "erano", "essere",
    "avere", "ha", "hanno",
];
static PT_STOPWORDS: [&str; 39] = [
    "o", "a", "os", "as", "um", "uma", "uns", "umas", "de", "da", "do", "das", "dos", "em", "por",
    "para", "com", "sem", "sobre", "entre", "mas", "ou", "se", "que", "quando", "como", "onde",
    "quem", "qual", "quais", "este", "esta", "estes", "estas", "aquele", "aquela", "foi", "eram",
    "ser",
];
static PL_STOPWORDS: [&str; 38] = [
    "i", "w", "z", "na", "do", "od", "za", "po", "przez", "dla", "o", "u", "pod", "nad", "przed",
    "bez", "czy", "nie", "tak", "ale", "lub", "albo", "to", "ten", "ta", "te", "ci", "co",
    "który", "która", "które", "którzy", "być", "jest", "są", "był", "była", "było",
];
static NL_STOPWORDS: [&str; 33] = [
    "de", "het", "een", "en", "van", "op", "in", "naar", "met", "voor", "door", "over", "onder",
    "tussen", "tegen", "zonder", "om", "maar", "of", "als", "ook", "bij", "tot", "uit", "aan",
    "te", "er", "je", "hij", "zij", "wij", "ik", "is",
];
static RU_STOPWORDS: [&str; 79] = [
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
    "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "ее", "мне", "было",
    "вот", "от", "меня", "еще", "нет", "о", "из", "ему", "теперь", "когда", "даже", "ну", "вдруг",
    "ли", "если", "уже", "или", "ни", "быть", "был", "него", "до", "вас", "нибудь", "опять", "уж",
    "вам", "ведь", "там", "потом", "себя", "ничего", "ей", "может", "они", "тут", "где", "есть",
    "надо", "ней", "для", "мы", "тебя", "их", "чем", "была", "сам", "чего", "раз", "себе", "под",
    "кто",
];
static CS_STOPWORDS: [&str; 47] = [
    "a", "i", "že", "co", "jak", "když", "ale", "už", "proto", "tak", "by", "byl", "byla", "bylo",
    "byli", "aby", "jsem", "jsme", "jste", "jsi", "být", "mít", "ten", "to", "ta", "tento",
    "tato", "toto", "se", "si", "na", "v", "ve", "z", "ze", "do", "s", "o", "u", "k", "pro",
    "který", "protože", "je", "není", "může", "tady",
];

/// Result of scoring a text window against every candidate language.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub language: String,
    pub score: u32,
}

/// Score `text` against `allowed` (or every lexical-evidence language when
/// `allowed` is `None`). See spec §4.2 for the exact arithmetic.
pub fn score(text: &str, allowed: Option<&[String]>) -> ScoreResult {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|w| !w.is_empty())
        .collect();
    let char_set: HashSet<char> = text.chars().collect();

    let table = table();
    let candidates: Vec<&str> = match allowed {
        Some(langs) => langs.iter().map(|s| s.as_str()).collect(),
        None => table.lexical_codes().collect(),
    };

    let mut best_lang: Option<&str> = None;
    let mut best_score = 0u32;
    let mut best_stop_hits = 0u32;

    for &lang in &candidates {
        let Some(entry) = table.get(lang) else { continue };
        let stop_hits = words.iter().filter(|w| entry.stopwords.contains(w)).count() as u32;
        let diacritic_hits =
            char_set.iter().filter(|c| entry.diacritics.contains(**c)).count() as u32;
        let candidate_score = 2 * stop_hits + diacritic_hits;

        let better = match best_lang {
            None => true,
            Some(_) => {
                candidate_score > best_score
                    || (candidate_score == best_score && stop_hits > best_stop_hits)
                    || (candidate_score == best_score
                        && stop_hits == best_stop_hits
                        && best_lang.map(|b| lang < b).unwrap_or(false))
            }
        };
        if better {
            best_lang = Some(lang);
            best_score = candidate_score;
            best_stop_hits = stop_hits;
        }
    }

    ScoreResult {
        language: best_lang.unwrap_or("unknown").to_string(),
        score: best_score,
    }
}

/// Correct an acoustic-model label against lexical evidence in `text`.
///
/// Flips to the best-scoring candidate when the predicted label scored zero,
/// or when some other candidate clearly outscores it. See spec §4.2.
pub fn correct(text: &str, predicted: &str, allowed: Option<&[String]>) -> String {
    let best = score(text, allowed);
    if best.language != predicted {
        let predicted_score = score_single(text, predicted);
        if predicted_score == 0 || best.score > predicted_score {
            return best.language;
        }
    }
    predicted.to_string()
}

fn score_single(text: &str, lang: &str) -> u32 {
    let Some(entry) = table().get(lang) else { return 0 };
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|w| !w.is_empty())
        .collect();
    let char_set: HashSet<char> = text.chars().collect();
    let stop_hits = words.iter().filter(|w| entry.stopwords.contains(w)).count() as u32;
    let diacritic_hits = char_set.iter().filter(|c| entry.diacritics.contains(**c)).count() as u32;
    2 * stop_hits + diacritic_hits
}
