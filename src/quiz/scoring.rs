use rand::seq::SliceRandom;
use rand::Rng;

use super::{AnswerId, AnswerSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Personality {
    Explorer,
    Dreamer,
    Leader,
    Mystic,
}

impl Personality {
    pub fn for_answer(id: AnswerId) -> Self {
        match id {
            AnswerId::A => Personality::Explorer,
            AnswerId::B => Personality::Dreamer,
            AnswerId::C => Personality::Leader,
            AnswerId::D => Personality::Mystic,
        }
    }

    /// The English type name shown under the result title.
    pub fn label(self) -> &'static str {
        match self {
            Personality::Explorer => "Explorer",
            Personality::Dreamer => "Dreamer",
            Personality::Leader => "Leader",
            Personality::Mystic => "Mystic",
        }
    }

    pub fn outcome(self) -> &'static PersonalityOutcome {
        match self {
            Personality::Explorer => &OUTCOMES[0],
            Personality::Dreamer => &OUTCOMES[1],
            Personality::Leader => &OUTCOMES[2],
            Personality::Mystic => &OUTCOMES[3],
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Recommendation {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PersonalityOutcome {
    pub kind: Personality,
    pub title: &'static str,
    pub description: &'static str,
    pub male: Recommendation,
    pub female: Recommendation,
}

static OUTCOMES: [PersonalityOutcome; 4] = [
    PersonalityOutcome {
        kind: Personality::Explorer,
        title: "Nhà Thám Hiểm",
        description: "Bạn là người không ngừng tìm kiếm điều mới mẻ. Năng lượng của bạn lan tỏa khắp nơi, và mỗi ngày là một cuộc phiêu lưu chờ đón. Năm 2026 sẽ mở ra những cánh cửa bất ngờ cho tâm hồn khao khát khám phá của bạn.",
        male: Recommendation {
            name: "Horizon Explorer - Nam",
            description: "Hương cam bergamot, gỗ tuyết tùng và một chút hổ phách ấm áp",
        },
        female: Recommendation {
            name: "Horizon Explorer - Nữ",
            description: "Hương chanh Amalfi, hoa nhài và gỗ đàn hương nhẹ nhàng",
        },
    },
    PersonalityOutcome {
        kind: Personality::Dreamer,
        title: "Người Mơ Mộng",
        description: "Bạn sống với cảm xúc và trí tưởng tượng phong phú. Thế giới nội tâm của bạn là một bức tranh đầy màu sắc. Năm 2026 sẽ là lúc những giấc mơ của bạn dần trở thành hiện thực.",
        male: Recommendation {
            name: "Velvet Dreams - Nam",
            description: "Hương oải hương, vani Madagascar và xạ hương thanh lịch",
        },
        female: Recommendation {
            name: "Velvet Dreams - Nữ",
            description: "Hương hoa mẫu đơn, đào trắng và kem sữa dịu dàng",
        },
    },
    PersonalityOutcome {
        kind: Personality::Leader,
        title: "Người Dẫn Lối",
        description: "Bạn sinh ra để lãnh đạo. Sự tự tin và tầm nhìn của bạn truyền cảm hứng cho những người xung quanh. Năm 2026 sẽ chứng kiến bạn chinh phục những đỉnh cao mới.",
        male: Recommendation {
            name: "Royal Command - Nam",
            description: "Hương oud hoàng gia, da thuộc Ý và hương thảo tươi",
        },
        female: Recommendation {
            name: "Royal Command - Nữ",
            description: "Hương hoa iris, nhựa thơm và gỗ hồng quyền lực",
        },
    },
    PersonalityOutcome {
        kind: Personality::Mystic,
        title: "Người Huyền Bí",
        description: "Bạn có chiều sâu khó dò và sức hút không thể cưỡng lại. Trực giác mạnh mẽ dẫn lối bạn qua mọi quyết định. Năm 2026 sẽ hé lộ những bí mật vũ trụ dành riêng cho bạn.",
        male: Recommendation {
            name: "Midnight Oracle - Nam",
            description: "Hương trầm hương Oman, nhục đậu khấu và vetiver đêm",
        },
        female: Recommendation {
            name: "Midnight Oracle - Nữ",
            description: "Hương hoắc hương, hoa huệ đen và xạ hương huyền bí",
        },
    },
];

/// Occurrences of each answer letter, indexed by `AnswerId::index`.
pub fn tally(answers: &AnswerSet) -> [usize; 4] {
    let mut counts = [0; 4];
    for choice in answers.choices() {
        counts[choice.index()] += 1;
    }
    counts
}

/// Letters sharing the highest tally, in A..D order.
pub fn tie_set(counts: &[usize; 4]) -> Vec<AnswerId> {
    let max = counts.iter().copied().max().unwrap_or(0);
    AnswerId::ALL
        .iter()
        .copied()
        .filter(|id| counts[id.index()] == max)
        .collect()
}

/// Maps a complete answer set to its personality. A letter counts the same
/// whichever question it answered; ties are broken uniformly with `rng`.
pub fn score<R: Rng + ?Sized>(answers: &AnswerSet, rng: &mut R) -> &'static PersonalityOutcome {
    debug_assert!(!answers.is_empty(), "scoring an empty answer set");

    let counts = tally(answers);
    let ties = tie_set(&counts);
    // tie_set always holds at least one letter
    let winner = ties.choose(rng).copied().unwrap_or(AnswerId::A);

    log::debug!("tally {:?}, ties {:?}, picked {}", counts, ties, winner);
    Personality::for_answer(winner).outcome()
}
