use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// True for tokens the caption model over-produces: anything ending in "ing",
/// except the literal "building" which is a legitimate recurring subject.
fn is_gerund_noise(token: &str) -> bool {
    token != "building" && token.ends_with("ing")
}

/// Tokenize caption text: trim, lowercase, split on single spaces.
///
/// Splitting is on the literal space character, not general whitespace, so
/// consecutive spaces yield empty tokens; those are kept to match the
/// reference corpus statistics. A caption that trims to nothing yields an
/// empty sequence.
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_opts(text, true)
}

/// Tokenize with stop-word filtering under caller control.
pub fn tokenize_opts(text: &str, strip_stopwords: bool) -> Vec<String> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return Vec::new();
    }

    normalized
        .split(' ')
        .filter(|token| !is_gerund_noise(token))
        .filter(|token| !strip_stopwords || !is_stopword(token))
        .map(str::to_string)
        .collect()
}
