//! 코퍼스 변형 (부동산 블로그 / 착한가게)
//!
//! 변형마다 시드 문서, 예시 질문, 응답 규칙, 화면 문구가 고정되어 있습니다.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::responder::ResponseRule;

/// 챗봇 코퍼스 종류
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// 네이버 블로그 부동산 데이터
    RealEstate,
    /// 지역 착한가게 목록
    Shop,
}

/// 화면 문구 묶음
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UiText {
    pub page_title: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub input_placeholder: &'static str,
    pub add_placeholder: &'static str,
    pub add_success: &'static str,
    pub list_title: &'static str,
}

// ============================================================================
// 부동산 변형
// ============================================================================

const PROPERTY_SEEDS: [&str; 5] = [
    "강남 아파트 가격이 3개월 연속 하락세를 보이고 있습니다. 많은 블로거들이 금리 인상의 영향이라고 분석하고 있습니다.",
    "경기도 지역 아파트는 전월 대비 2.5% 하락했으며, 매수자들의 관망세가 계속되고 있습니다.",
    "30대 블로거들은 대출 규제와 금리 인상으로 내집 마련이 더 어려워졌다고 호소하고 있습니다.",
    "부동산 전문가들은 현재 시장 상황을 '조정기'로 보고 있으며, 1-2년간 조정이 계속될 것으로 전망합니다.",
    "40-50대 블로거들은 투자용 부동산의 가치 하락과 임대 수익률 감소에 대한 우려를 표하고 있습니다.",
];

const PROPERTY_EXAMPLES: [&str; 4] = [
    "최근 아파트 가격 변화에 대한 사람들의 생각이 어떤가요?",
    "30대들은 부동산 시장에 대해 어떻게 생각하나요?",
    "부동산 시장 앞으로 어떻게 될까요?",
    "경기도 지역 아파트 가격은 어떻게 변했나요?",
];

const PROPERTY_RULES: [ResponseRule; 3] = [
    ResponseRule {
        keywords: &["가격"],
        suffix: "가격 동향을 살펴보면, 전반적으로 하락세를 보이고 있습니다.",
    },
    ResponseRule {
        keywords: &["전망", "앞으로"],
        suffix: "향후 시장 전망은 1-2년간의 조정기가 예상됩니다.",
    },
    ResponseRule {
        keywords: &["30대", "젊은"],
        suffix: "특히 30대는 대출 규제와 금리 인상에 민감하게 반응하고 있습니다.",
    },
];

const PROPERTY_UI: UiText = UiText {
    page_title: "부동산 데이터 분석 챗봇",
    icon: "🏠",
    description: "네이버 블로그에서 수집한 부동산 데이터에 대해 질문해보세요.",
    input_placeholder: "질문을 입력하세요 (예: 최근 아파트 가격 변화 추세는 어떤가요?)",
    add_placeholder: "새로운 부동산 데이터를 입력하세요",
    add_success: "데이터가 추가되었습니다!",
    list_title: "부동산 데이터 확인",
};

// ============================================================================
// 착한가게 변형
// ============================================================================

const SHOP_SEEDS: [&str; 5] = [
    "망원동 '할매국수'는 잔치국수를 4,000원에 판매하는 착한가격업소로, 매일 오전 10시부터 오후 8시까지 영업합니다.",
    "성수동 '정든 세탁소'는 셔츠 한 벌 세탁을 2,000원에 해주며, 지하철 성수역 3번 출구 근처에 있습니다.",
    "연남동 '소담 미용실'은 커트 가격이 8,000원으로 주변 미용실보다 저렴하고, 월요일은 휴무입니다.",
    "합정동 '우리동네 반찬가게'는 반찬 3종을 10,000원에 판매하며, 동네 주민들의 재방문율이 높습니다.",
    "신촌 '청년 김밥'은 김밥 한 줄을 2,500원에 판매하고, 대학생 할인을 제공하며 밤 10시까지 영업합니다.",
];

const SHOP_EXAMPLES: [&str; 4] = [
    "저렴한 국수집이 있나요?",
    "성수역 근처 세탁소 위치 알려주세요",
    "미용실 휴무일이 언제인가요?",
    "대학생 할인 되는 가게가 있나요?",
];

const SHOP_RULES: [ResponseRule; 3] = [
    ResponseRule {
        keywords: &["가격", "저렴", "얼마"],
        suffix: "착한가게들은 대부분 주변 시세보다 20~30% 저렴한 가격을 유지하고 있습니다.",
    },
    ResponseRule {
        keywords: &["위치", "근처", "어디"],
        suffix: "가게 위치는 방문 전 지도 앱에서 한 번 더 확인하시는 것을 권장합니다.",
    },
    ResponseRule {
        keywords: &["영업", "시간", "휴무"],
        suffix: "영업시간과 휴무일은 가게 사정에 따라 변경될 수 있습니다.",
    },
];

const SHOP_UI: UiText = UiText {
    page_title: "우리동네 착한가게 챗봇",
    icon: "🏪",
    description: "지역 착한가게 정보에 대해 질문해보세요.",
    input_placeholder: "질문을 입력하세요 (예: 저렴한 국수집이 있나요?)",
    add_placeholder: "새로운 가게 정보를 입력하세요",
    add_success: "가게 정보가 추가되었습니다!",
    list_title: "가게 데이터 확인",
};

impl Variant {
    /// 컬렉션 이름
    pub fn collection_name(&self) -> &'static str {
        match self {
            Self::RealEstate => "property_data",
            Self::Shop => "shop_data",
        }
    }

    /// 시드 문서 `source` 메타데이터 접두사
    pub fn seed_source_prefix(&self) -> &'static str {
        match self {
            Self::RealEstate => "blog",
            Self::Shop => "shop",
        }
    }

    pub fn seed_documents(&self) -> &'static [&'static str] {
        match self {
            Self::RealEstate => &PROPERTY_SEEDS,
            Self::Shop => &SHOP_SEEDS,
        }
    }

    pub fn example_questions(&self) -> &'static [&'static str] {
        match self {
            Self::RealEstate => &PROPERTY_EXAMPLES,
            Self::Shop => &SHOP_EXAMPLES,
        }
    }

    /// 응답 규칙 (선언 순서 = 우선순위)
    pub fn rules(&self) -> &'static [ResponseRule] {
        match self {
            Self::RealEstate => &PROPERTY_RULES,
            Self::Shop => &SHOP_RULES,
        }
    }

    /// 응답 첫 줄 라벨
    pub fn response_prefix(&self) -> &'static str {
        match self {
            Self::RealEstate => "블로그 데이터 분석 결과",
            Self::Shop => "착한가게 정보 검색 결과",
        }
    }

    /// 검색 결과가 없을 때의 고정 응답
    pub fn not_found_message(&self) -> &'static str {
        match self {
            Self::RealEstate => "죄송합니다, 질문에 관련된 데이터를 찾을 수 없습니다.",
            Self::Shop => "죄송합니다, 질문에 맞는 가게 정보를 찾을 수 없습니다.",
        }
    }

    pub fn ui(&self) -> &'static UiText {
        match self {
            Self::RealEstate => &PROPERTY_UI,
            Self::Shop => &SHOP_UI,
        }
    }
}

impl FromStr for Variant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "real-estate" | "realestate" | "property" => Ok(Self::RealEstate),
            "shop" | "shops" => Ok(Self::Shop),
            other => anyhow::bail!("Unknown variant: {} (expected real-estate or shop)", other),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RealEstate => write!(f, "real-estate"),
            Self::Shop => write!(f, "shop"),
        }
    }
}
