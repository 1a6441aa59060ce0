use super::{Answer, AnswerId, Question};

pub const LANDING_TITLE: &str = "UNLOCK YOUR 2026";
pub const LANDING_TAGLINE: &str = "Nếu có một cánh cửa dẫn tới năm rực rỡ, bạn có mở không?";
pub const START_LABEL: &str = "BẮT ĐẦU";
pub const RESTART_LABEL: &str = "Làm lại bài test";
pub const RESULT_HEADER: &str = "Kết quả của bạn";

/// What the door says while it opens toward the landing screen.
pub const LANDING_VOICE_LINE: &str = "Ta đã đợi rất lâu để gặp bạn...";

// One per question, in catalog order.
const QUESTION_VOICE_LINES: [&str; 5] = [
    "Bên kia cánh cửa có điều gì đó đang chờ bạn.",
    "Mỗi bước đi đều có ý nghĩa riêng.",
    "Bạn đang đến gần hơn rồi.",
    "Ánh sáng đang dần hé mở.",
    "Chuẩn bị. Ánh sáng sắp bùng nổ.",
];

const QUESTIONS: [Question; 5] = [
    Question {
        id: 1,
        prompt: "Điều gì thôi thúc bạn bước qua cánh cửa mới?",
        micro_copy: "Mỗi lựa chọn mở ra một con đường...",
        answers: [
            Answer::new(AnswerId::A, "Sự tò mò về điều chưa biết"),
            Answer::new(AnswerId::B, "Khát khao được tự do"),
            Answer::new(AnswerId::C, "Mục tiêu rõ ràng phía trước"),
            Answer::new(AnswerId::D, "Linh cảm từ sâu thẳm bên trong"),
        ],
    },
    Question {
        id: 2,
        prompt: "Buổi sáng lý tưởng của bạn có mùi gì?",
        micro_copy: "Hương thơm đầu tiên định hình cả ngày...",
        answers: [
            Answer::new(AnswerId::A, "Cà phê và gỗ ấm"),
            Answer::new(AnswerId::B, "Hoa tươi và gió biển"),
            Answer::new(AnswerId::C, "Da thuộc và trà đậm"),
            Answer::new(AnswerId::D, "Trầm hương và sương sớm"),
        ],
    },
    Question {
        id: 3,
        prompt: "Khi đối mặt với thay đổi, bạn thường…",
        micro_copy: "Cách bạn đón nhận thay đổi nói lên bạn là ai...",
        answers: [
            Answer::new(AnswerId::A, "Hào hứng khám phá cơ hội mới"),
            Answer::new(AnswerId::B, "Chờ đợi và quan sát"),
            Answer::new(AnswerId::C, "Lập kế hoạch chi tiết"),
            Answer::new(AnswerId::D, "Tin vào trực giác dẫn lối"),
        ],
    },
    Question {
        id: 4,
        prompt: "Bạn muốn người khác nhớ đến bạn như…",
        micro_copy: "Dấu ấn bạn để lại trong lòng người...",
        answers: [
            Answer::new(AnswerId::A, "Người luôn mang đến năng lượng mới"),
            Answer::new(AnswerId::B, "Người nhẹ nhàng và tinh tế"),
            Answer::new(AnswerId::C, "Người đáng tin cậy và mạnh mẽ"),
            Answer::new(AnswerId::D, "Người bí ẩn và sâu sắc"),
        ],
    },
    Question {
        id: 5,
        prompt: "Mùi hương bạn mang khi bước ra đường?",
        micro_copy: "Hương thơm cuối cùng hoàn thiện bạn...",
        answers: [
            Answer::new(AnswerId::A, "Tươi mát, năng động"),
            Answer::new(AnswerId::B, "Ngọt ngào, lãng mạn"),
            Answer::new(AnswerId::C, "Sang trọng, quyền lực"),
            Answer::new(AnswerId::D, "Huyền bí, quyến rũ"),
        ],
    },
];

/// Fixed, ordered question list. Cheap to copy: it only borrows static data.
#[derive(Debug, Clone, Copy)]
pub struct QuestionCatalog {
    questions: &'static [Question],
    voice_lines: &'static [&'static str],
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl QuestionCatalog {
    pub const fn standard() -> Self {
        Self {
            questions: &QUESTIONS,
            voice_lines: &QUESTION_VOICE_LINES,
        }
    }

    /// Panics when `index` is out of range; callers only walk `0..count()`.
    pub fn question_at(&self, index: usize) -> &'static Question {
        assert!(
            index < self.questions.len(),
            "question index {} out of range (catalog has {})",
            index,
            self.questions.len()
        );
        &self.questions[index]
    }

    pub fn count(&self) -> usize {
        self.questions.len()
    }

    pub fn voice_line(&self, index: usize) -> &'static str {
        self.voice_lines.get(index).copied().unwrap_or(LANDING_VOICE_LINE)
    }

    pub fn progress_label(&self, index: usize) -> String {
        format!("Câu {}/{}", index + 1, self.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_five_ordered_questions_with_four_answers() {
        let catalog = QuestionCatalog::standard();
        assert_eq!(catalog.count(), 5);
        for index in 0..catalog.count() {
            let question = catalog.question_at(index);
            assert_eq!(question.id as usize, index + 1);
            let ids: Vec<AnswerId> = question.answers.iter().map(|a| a.id).collect();
            assert_eq!(ids, AnswerId::ALL.to_vec());
        }
    }

    #[test]
    fn answer_lookup_by_id() {
        let question = QuestionCatalog::standard().question_at(1);
        assert_eq!(question.answer(AnswerId::C).text, "Da thuộc và trà đậm");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_index_is_a_precondition_violation() {
        QuestionCatalog::standard().question_at(5);
    }

    #[test]
    fn progress_label_is_one_based() {
        assert_eq!(QuestionCatalog::standard().progress_label(0), "Câu 1/5");
    }
}
