use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use thiserror::Error;

use crate::db::types::QuestionKind;

pub(crate) const TRUE_OPTION: &str = "صح";
pub(crate) const FALSE_OPTION: &str = "خطأ";

/// Canonical question shape produced by every import path. The
/// `correct_answer` is always one of the `options` keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewQuestion {
    pub(crate) question_text: String,
    pub(crate) kind: QuestionKind,
    pub(crate) options: BTreeMap<String, String>,
    pub(crate) correct_answer: String,
    pub(crate) question_order: i32,
}

#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("spreadsheet has no sheets")]
    EmptyWorkbook,
    #[error("no questions found in input")]
    NoQuestions,
}

const QUESTION_HEADERS: &[&str] = &["السؤال", "Question", "question"];
const TYPE_HEADERS: &[&str] = &["النوع", "Type", "type"];
const ANSWER_HEADERS: &[&str] = &["الإجابة الصحيحة", "Correct Answer", "correct_answer"];
const OPTION_HEADERS: &[(&str, &[&str])] = &[
    ("a", &["الخيار أ", "Option A", "option_a"]),
    ("b", &["الخيار ب", "Option B", "option_b"]),
    ("c", &["الخيار ج", "Option C", "option_c"]),
    ("d", &["الخيار د", "Option D", "option_d"]),
];

/// Reads the first sheet of an xlsx workbook. The header row may use
/// Arabic or English column names. Rows missing the question text or a
/// resolvable answer are skipped; order follows the source rows.
pub(crate) fn parse_spreadsheet(bytes: &[u8]) -> Result<Vec<NewQuestion>, ImportError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|err| ImportError::Spreadsheet(err.to_string()))?;
    let sheet_name =
        workbook.sheet_names().first().cloned().ok_or(ImportError::EmptyWorkbook)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| ImportError::Spreadsheet(err.to_string()))?;

    let mut rows = range.rows();
    let header: Vec<String> =
        rows.next().ok_or(ImportError::NoQuestions)?.iter().map(cell_text).collect();

    let question_col = find_column(&header, QUESTION_HEADERS);
    let type_col = find_column(&header, TYPE_HEADERS);
    let answer_col = find_column(&header, ANSWER_HEADERS);
    let option_cols: Vec<(&str, Option<usize>)> = OPTION_HEADERS
        .iter()
        .map(|(key, aliases)| (*key, find_column(&header, aliases)))
        .collect();

    let mut questions = Vec::new();

    for (index, row) in rows.enumerate() {
        let cell = |col: Option<usize>| col.and_then(|c| row.get(c)).map(cell_text);

        let question_text = cell(question_col).unwrap_or_default();
        if question_text.is_empty() {
            continue;
        }

        let type_text = cell(type_col).unwrap_or_default().to_lowercase();
        let is_multiple = type_text.contains("اختيار") || type_text.contains("multiple");

        let (kind, options) = if is_multiple {
            let options: BTreeMap<String, String> = option_cols
                .iter()
                .filter_map(|(key, col)| {
                    cell(*col)
                        .filter(|text| !text.is_empty())
                        .map(|text| (key.to_string(), text))
                })
                .collect();
            (QuestionKind::Multiple, options)
        } else {
            (QuestionKind::TrueFalse, true_false_options())
        };

        let Some(correct_answer) =
            cell(answer_col).as_deref().and_then(answer_key)
        else {
            continue;
        };

        if !options.contains_key(correct_answer) {
            continue;
        }

        questions.push(NewQuestion {
            question_text,
            kind,
            options,
            correct_answer: correct_answer.to_string(),
            question_order: index as i32 + 1,
        });
    }

    if questions.is_empty() {
        return Err(ImportError::NoQuestions);
    }
    Ok(questions)
}

/// Parses structured free text. Questions start at `س1:` or `سؤال 1:`
/// markers, options use a leading letter plus `)`, `）` or `.`, and a
/// line mentioning the answer closes the block.
pub(crate) fn parse_text(text: &str) -> Result<Vec<NewQuestion>, ImportError> {
    let mut drafts: Vec<Draft> = Vec::new();
    let mut current: Option<Draft> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(question_text) = strip_question_marker(line) {
            if let Some(done) = current.take() {
                drafts.push(done);
            }
            current = Some(Draft {
                question_text: question_text.to_string(),
                options: BTreeMap::new(),
                correct_answer: None,
            });
            continue;
        }

        let Some(draft) = current.as_mut() else { continue };

        if let Some((key, value)) = split_option_line(line) {
            draft.options.insert(key.to_string(), value.to_string());
        } else if is_answer_line(line) {
            draft.correct_answer = answer_text_after_colon(line).and_then(answer_key);
        }
    }

    if let Some(done) = current.take() {
        drafts.push(done);
    }

    let questions: Vec<NewQuestion> = drafts
        .into_iter()
        .filter_map(Draft::finish)
        .enumerate()
        .map(|(index, mut question)| {
            question.question_order = index as i32 + 1;
            question
        })
        .collect();

    if questions.is_empty() {
        return Err(ImportError::NoQuestions);
    }
    Ok(questions)
}

struct Draft {
    question_text: String,
    options: BTreeMap<String, String>,
    correct_answer: Option<&'static str>,
}

impl Draft {
    fn finish(self) -> Option<NewQuestion> {
        let correct_answer = self.correct_answer?;
        if self.question_text.is_empty() || !self.options.contains_key(correct_answer) {
            return None;
        }

        let two_options = self.options.len() == 2;
        let true_false_labels = self
            .options
            .get("a")
            .map(|a| a == TRUE_OPTION || a.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
            && self
                .options
                .get("b")
                .map(|b| b == FALSE_OPTION || b.eq_ignore_ascii_case("false"))
                .unwrap_or(false);

        let kind = if two_options || true_false_labels {
            QuestionKind::TrueFalse
        } else {
            QuestionKind::Multiple
        };

        Some(NewQuestion {
            question_text: self.question_text,
            kind,
            options: self.options,
            correct_answer: correct_answer.to_string(),
            question_order: 0,
        })
    }
}

pub(crate) fn true_false_options() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("a".to_string(), TRUE_OPTION.to_string()),
        ("b".to_string(), FALSE_OPTION.to_string()),
    ])
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn find_column(header: &[String], aliases: &[&str]) -> Option<usize> {
    header.iter().position(|name| {
        aliases.iter().any(|alias| name == alias || name.eq_ignore_ascii_case(alias))
    })
}

fn strip_question_marker(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("سؤال").or_else(|| line.strip_prefix("س"))?;
    let rest = rest.trim_start();
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digits == 0 {
        return None;
    }
    let after = &rest[digits..];
    let after = after.strip_prefix(':').or_else(|| after.strip_prefix('：'))?;
    Some(after.trim_start())
}

fn split_option_line(line: &str) -> Option<(&'static str, &str)> {
    let mut chars = line.char_indices();
    let (_, letter) = chars.next()?;
    let key = choice_key(letter)?;
    let (sep_index, sep) = chars.next()?;
    if !matches!(sep, ')' | '）' | '.') {
        return None;
    }
    Some((key, line[sep_index + sep.len_utf8()..].trim()))
}

fn is_answer_line(line: &str) -> bool {
    line.contains("الإجابة") || line.contains("الاجابة") || line.contains("Answer")
}

fn answer_text_after_colon(line: &str) -> Option<&str> {
    line.split_once(':')
        .or_else(|| line.split_once('：'))
        .map(|(_, after)| after.trim())
}

/// Maps an answer cell or fragment to a canonical option key. Accepts
/// latin and Arabic choice letters as well as true/false words.
fn answer_key(text: &str) -> Option<&'static str> {
    let text = text.trim();
    match text.to_lowercase().as_str() {
        "صح" | "true" => return Some("a"),
        "خطأ" | "خطا" | "false" => return Some("b"),
        _ => {}
    }
    choice_key(text.chars().next()?)
}

fn choice_key(letter: char) -> Option<&'static str> {
    match letter.to_ascii_lowercase() {
        'أ' | 'ا' | 'a' => Some("a"),
        'ب' | 'b' => Some("b"),
        'ج' | 'c' => Some("c"),
        'د' | 'd' => Some("d"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arabic_multiple_choice_block() {
        let text = "\
س1: ما هي عاصمة فرنسا؟
أ) باريس
ب) لندن
ج) روما
د) برلين
الإجابة: أ
";
        let questions = parse_text(text).unwrap();
        assert_eq!(questions.len(), 1);
        let question = &questions[0];
        assert_eq!(question.question_text, "ما هي عاصمة فرنسا؟");
        assert_eq!(question.kind, QuestionKind::Multiple);
        assert_eq!(question.options.len(), 4);
        assert_eq!(question.options["a"], "باريس");
        assert_eq!(question.correct_answer, "a");
        assert_eq!(question.question_order, 1);
    }

    #[test]
    fn parses_english_letters_and_separators() {
        let text = "\
س1: 2 + 2 = ?
a) 3
B) 4
c. 5
Answer: b
";
        let question = &parse_text(text).unwrap()[0];
        assert_eq!(question.options["b"], "4");
        assert_eq!(question.correct_answer, "b");
    }

    #[test]
    fn two_option_questions_become_true_false() {
        let text = "\
سؤال 1: الأرض كروية
أ) صح
ب) خطأ
الاجابة: أ
";
        let question = &parse_text(text).unwrap()[0];
        assert_eq!(question.kind, QuestionKind::TrueFalse);
        assert_eq!(question.correct_answer, "a");
    }

    #[test]
    fn question_without_answer_is_dropped() {
        let text = "\
س1: سؤال ناقص
أ) خيار
ب) خيار آخر
س2: سؤال كامل
أ) نعم
ب) لا
الإجابة: ب
";
        let questions = parse_text(text).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question_text, "سؤال كامل");
        assert_eq!(questions[0].question_order, 1);
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        let text = "\
مقدمة لا علاقة لها
س1: سؤال
أ) أول
ب) ثانٍ
ملاحظة في المنتصف
الإجابة: ا
";
        let question = &parse_text(text).unwrap()[0];
        assert_eq!(question.correct_answer, "a");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse_text(""), Err(ImportError::NoQuestions)));
        assert!(matches!(parse_text("نص بدون أسئلة"), Err(ImportError::NoQuestions)));
    }

    #[test]
    fn answer_words_map_to_option_keys() {
        assert_eq!(answer_key("صح"), Some("a"));
        assert_eq!(answer_key("False"), Some("b"));
        assert_eq!(answer_key("أ"), Some("a"));
        assert_eq!(answer_key("D"), Some("d"));
        assert_eq!(answer_key("x"), None);
    }

    #[test]
    fn spreadsheet_rejects_garbage_bytes() {
        assert!(matches!(parse_spreadsheet(b"not an xlsx"), Err(ImportError::Spreadsheet(_))));
    }
}
