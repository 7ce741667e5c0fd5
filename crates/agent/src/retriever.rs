use std::sync::Arc;

use autostream_core::{KnowledgeDocument, Plan, Speaker, Turn};

use crate::heuristics::{self, PlanMentions};

/// How many recent user turns are consulted when the current utterance
/// mentions pricing but no plan by name.
const HISTORY_WINDOW: usize = 6;

const ABOUT_PRODUCT_PHRASES: &[&str] = &[
    "what is autostream",
    "what's autostream",
    "what does autostream",
    "tell me about autostream",
    "describe autostream",
    "explain autostream",
];

const COMPARISON_PHRASES: &[&str] = &[
    "difference",
    "compare",
    "comparison",
    "both plans",
    "two plans",
    "all plans",
    "each plan",
    "versus",
    "which plan",
];

const POLICY_PHRASES: &[&str] =
    &["policy", "policies", "refund", "money back", "cancel", "support"];

const PLAN_INQUIRY_PHRASES: &[&str] =
    &["tell me", "about", "information", "details", "what is", "what's"];

const FEATURE_PHRASES: &[&str] =
    &["feature", "capabilit", "offer", "provide", "include", "service"];

const CAPABILITY_PHRASES: &[&str] = &[
    "what can you help",
    "what can you do",
    "what do you do",
    "how can you help",
    "what are you",
    "what services",
];

/// Normalized view of one utterance plus the plan context resolved from
/// recent history.
#[derive(Debug)]
struct RetrievalQuery {
    text: String,
    /// Plan names in the current utterance only.
    current: PlanMentions,
    /// Plan names after history disambiguation. Current-utterance mentions
    /// always take precedence; history is consulted only when the utterance
    /// has pricing vocabulary but no plan name.
    resolved: PlanMentions,
}

impl RetrievalQuery {
    fn parse(utterance: &str, history: &[Turn]) -> Self {
        let text = heuristics::normalize(utterance);
        let current = heuristics::plan_mentions(&text);

        let resolved = if !current.any() && !history.is_empty() && has_pricing_vocabulary(&text) {
            let recent: Vec<&str> = history
                .iter()
                .rev()
                .filter(|turn| turn.speaker == Speaker::User)
                .take(HISTORY_WINDOW)
                .map(|turn| turn.text.as_str())
                .collect();
            heuristics::plan_mentions(&recent.join(" "))
        } else {
            current
        };

        Self { text, current, resolved }
    }

    fn asks_about_product(&self) -> bool {
        heuristics::contains_any(&self.text, ABOUT_PRODUCT_PHRASES)
            || (self.text.contains("autostream")
                && heuristics::contains_any(
                    &self.text,
                    &["what", "tell me", "describe", "explain"],
                ))
    }

    fn asks_comparison(&self) -> bool {
        heuristics::contains_any(&self.text, COMPARISON_PHRASES)
            || heuristics::has_any_word(&self.text, &["vs"])
    }

    fn asks_policy(&self) -> bool {
        heuristics::contains_any(&self.text, POLICY_PHRASES)
    }

    fn asks_pricing(&self) -> bool {
        has_pricing_vocabulary(&self.text) || self.is_general_plan_inquiry()
    }

    fn is_general_plan_inquiry(&self) -> bool {
        self.current.any() && heuristics::contains_any(&self.text, PLAN_INQUIRY_PHRASES)
    }

    fn asks_features(&self) -> bool {
        heuristics::contains_any(&self.text, FEATURE_PHRASES)
    }

    fn asks_capabilities(&self) -> bool {
        heuristics::contains_any(&self.text, CAPABILITY_PHRASES)
    }

    fn always(&self) -> bool {
        true
    }
}

fn has_pricing_vocabulary(normalized: &str) -> bool {
    heuristics::has_any_word(
        normalized,
        &["plan", "plans", "price", "prices", "cost", "costs", "fee", "fees", "monthly"],
    ) || heuristics::contains_any(normalized, &["pricing", "subscription"])
}

type Predicate = fn(&RetrievalQuery) -> bool;
type Handler = fn(&AnswerRetriever, &RetrievalQuery) -> String;

/// Category precedence is a contract: categories overlap in vocabulary, so
/// the first matching rule wins and the order below is load-bearing.
const RULES: &[(Predicate, Handler)] = &[
    (RetrievalQuery::asks_about_product, AnswerRetriever::product_overview),
    (RetrievalQuery::asks_comparison, AnswerRetriever::plan_comparison),
    (RetrievalQuery::asks_policy, AnswerRetriever::policy_answer),
    (RetrievalQuery::asks_pricing, AnswerRetriever::pricing_answer),
    (RetrievalQuery::asks_features, AnswerRetriever::feature_answer),
    (RetrievalQuery::asks_capabilities, AnswerRetriever::capability_summary),
    (RetrievalQuery::always, AnswerRetriever::clarification_request),
];

/// Answers product questions from the knowledge document using keyword
/// heuristics. Pure: reads only the document, the utterance, and history.
#[derive(Clone, Debug)]
pub struct AnswerRetriever {
    document: Arc<KnowledgeDocument>,
}

impl AnswerRetriever {
    pub fn new(document: Arc<KnowledgeDocument>) -> Self {
        Self { document }
    }

    pub fn answer(&self, utterance: &str, history: &[Turn]) -> String {
        let query = RetrievalQuery::parse(utterance, history);
        for (predicate, handler) in RULES {
            if predicate(&query) {
                return handler(self, &query);
            }
        }
        // RULES ends with an always-true predicate.
        self.clarification_request(&query)
    }

    fn product_overview(&self, _query: &RetrievalQuery) -> String {
        let basic = &self.document.pricing.basic;
        let pro = &self.document.pricing.pro;
        format!(
            "AutoStream is a SaaS product that provides automated video editing tools for \
             content creators.\n\n\
             **Our Plans:**\n\
             - **Basic Plan** ({}): {}, {} resolution\n\
             - **Pro Plan** ({}): {}, {} resolution, {}\n\n\
             Would you like to know more about our pricing plans or specific features?",
            basic.price,
            basic.videos,
            basic.resolution,
            pro.price,
            pro.videos,
            pro.resolution,
            pro.features.join(", "),
        )
    }

    /// Comparisons always cover both plans, even when a specific plan is
    /// also named in the utterance.
    fn plan_comparison(&self, _query: &RetrievalQuery) -> String {
        let mut response = format!(
            "Here's a comparison of our plans:\n\n{}\n{}",
            plan_block("Basic Plan", &self.document.pricing.basic),
            plan_block("Pro Plan", &self.document.pricing.pro),
        );
        response.push_str(
            "\n**Key Differences:**\n\
             - Pro Plan offers unlimited videos vs Basic's 10 videos/month\n\
             - Pro Plan has 4K resolution vs Basic's 720p\n\
             - Pro Plan includes AI captions (not available in Basic)",
        );
        response
    }

    fn policy_answer(&self, query: &RetrievalQuery) -> String {
        let policies = &self.document.policies;

        if query.current.pro {
            return format!(
                "**Pro Plan Policies:**\n- Refund: {}\n- Support: {}",
                policies.refund, policies.support
            );
        }
        if query.current.basic {
            return format!(
                "**Basic Plan Policies:**\n- Refund: {}\n\
                 - Support: 24/7 support is only available on the Pro plan",
                policies.refund
            );
        }
        if heuristics::contains_any(&query.text, &["refund", "money back", "cancel"]) {
            return format!("Our refund policy: {}", policies.refund);
        }
        if query.text.contains("support")
            && !heuristics::contains_any(
                &query.text,
                &["what can", "what do", "how can", "how do"],
            )
        {
            return format!("Support information: {}", policies.support);
        }
        format!(
            "**Company Policies:**\n- Refund Policy: {}\n- Support: {}",
            policies.refund, policies.support
        )
    }

    fn pricing_answer(&self, query: &RetrievalQuery) -> String {
        let pricing = &self.document.pricing;
        if query.resolved.exactly_one() {
            return if query.resolved.pro {
                plan_block("Pro Plan", &pricing.pro)
            } else {
                plan_block("Basic Plan", &pricing.basic)
            };
        }

        format!(
            "Here are our pricing plans:\n\n{}\n{}",
            plan_block("Basic Plan", &pricing.basic),
            plan_block("Pro Plan", &pricing.pro),
        )
    }

    fn feature_answer(&self, query: &RetrievalQuery) -> String {
        let pricing = &self.document.pricing;

        // Feature answers only go plan-specific on an explicit mention in
        // the current utterance; "what do you provide?" stays general.
        if query.current.exactly_one() {
            let (name, plan) = if query.current.pro {
                ("Pro Plan", &pricing.pro)
            } else {
                ("Basic Plan", &pricing.basic)
            };
            let mut response = format!("The {name} includes:\n- {}\n- {} resolution\n", plan.videos, plan.resolution);
            if !plan.features.is_empty() {
                response.push_str(&format!("- {}\n", plan.features.join(", ")));
            }
            response.push_str(&format!("\nPrice: {}", plan.price));
            return response;
        }

        format!(
            "AutoStream is a video editing SaaS platform that helps content creators edit \
             their videos. We offer two plans:\n\n\
             **Basic Plan** ({}): {}, {} resolution\n\
             **Pro Plan** ({}): {}, {} resolution, {}\n\n\
             Would you like to know more about a specific plan?",
            pricing.basic.price,
            pricing.basic.videos,
            pricing.basic.resolution,
            pricing.pro.price,
            pricing.pro.videos,
            pricing.pro.resolution,
            pricing.pro.features.join(", "),
        )
    }

    fn capability_summary(&self, _query: &RetrievalQuery) -> String {
        "I can help you with:\n\
         - Information about AutoStream's pricing plans (Basic and Pro)\n\
         - Details about our video editing features and capabilities\n\
         - Company policies (refunds, support)\n\
         - Signing up for an AutoStream account\n\n\
         What would you like to know more about?"
            .to_string()
    }

    fn clarification_request(&self, _query: &RetrievalQuery) -> String {
        "I can help you with pricing plans, refund policies, and support information. \
         Could you please clarify your question?"
            .to_string()
    }
}

fn plan_block(name: &str, plan: &Plan) -> String {
    let mut block =
        format!("**{name}:** {}\n- {}\n- {} resolution\n", plan.price, plan.videos, plan.resolution);
    if !plan.features.is_empty() {
        block.push_str(&format!("- Includes: {}\n", plan.features.join(", ")));
    }
    block
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use autostream_core::{KnowledgeDocument, Plan, Policies, Pricing, Speaker, Turn};

    use super::AnswerRetriever;

    fn document() -> KnowledgeDocument {
        KnowledgeDocument {
            pricing: Pricing {
                basic: Plan {
                    price: "$29/month".to_string(),
                    videos: "10 videos/month".to_string(),
                    resolution: "720p".to_string(),
                    features: Vec::new(),
                },
                pro: Plan {
                    price: "$99/month".to_string(),
                    videos: "Unlimited videos".to_string(),
                    resolution: "4K".to_string(),
                    features: vec!["AI captions".to_string(), "priority rendering".to_string()],
                },
            },
            policies: Policies {
                refund: "Full refund within 7 days of purchase.".to_string(),
                support: "24/7 support on the Pro plan.".to_string(),
            },
        }
    }

    fn retriever() -> AnswerRetriever {
        AnswerRetriever::new(Arc::new(document()))
    }

    fn user_turn(text: &str) -> Turn {
        Turn { speaker: Speaker::User, text: text.to_string() }
    }

    #[test]
    fn about_product_mentions_both_plan_prices_and_closing_prompt() {
        let reply = retriever().answer("What is AutoStream?", &[]);
        assert!(reply.contains("$29/month"));
        assert!(reply.contains("$99/month"));
        assert!(reply.contains("Would you like to know more"));
    }

    #[test]
    fn comparison_enumerates_both_plans_regardless_of_history() {
        let history = vec![user_turn("tell me about the pro plan")];
        let reply = retriever().answer("difference between plans", &history);
        assert!(reply.contains("Basic Plan"));
        assert!(reply.contains("Pro Plan"));
        assert!(reply.contains("10 videos/month"));
        assert!(reply.contains("720p"));
        assert!(reply.contains("4K"));
        assert!(reply.contains("AI captions"));
    }

    #[test]
    fn comparison_takes_precedence_over_a_named_plan() {
        let reply = retriever().answer("compare the basic plan against the other one", &[]);
        assert!(reply.contains("Basic Plan"));
        assert!(reply.contains("Pro Plan"));
        assert!(reply.contains("Key Differences"));
    }

    #[test]
    fn single_plan_pricing_excludes_the_other_plan() {
        let reply = retriever().answer("how much does the pro plan cost", &[]);
        assert!(reply.contains("$99/month"));
        assert!(reply.contains("4K"));
        assert!(!reply.contains("$29/month"));
        assert!(!reply.contains("720p"));
    }

    #[test]
    fn general_pricing_question_returns_both_plans() {
        let reply = retriever().answer("what are your prices?", &[]);
        assert!(reply.contains("Basic Plan"));
        assert!(reply.contains("Pro Plan"));
    }

    #[test]
    fn pricing_follow_up_uses_recent_history_for_the_plan() {
        let history = vec![
            user_turn("tell me about the pro plan"),
            Turn { speaker: Speaker::Assistant, text: "Pro details".to_string() },
        ];
        let reply = retriever().answer("and how much does it cost per month?", &history);
        assert!(reply.contains("$99/month"));
        assert!(!reply.contains("$29/month"));
    }

    #[test]
    fn current_utterance_plan_beats_history() {
        let history = vec![user_turn("tell me about the pro plan")];
        let reply = retriever().answer("what does the basic plan cost", &history);
        assert!(reply.contains("$29/month"));
        assert!(!reply.contains("$99/month"));
    }

    #[test]
    fn policy_answer_is_plan_specific_when_named() {
        let reply = retriever().answer("what is the refund policy on the basic plan", &[]);
        assert!(reply.contains("Basic Plan Policies"));
        assert!(reply.contains("only available on the Pro plan"));
    }

    #[test]
    fn refund_question_without_plan_returns_refund_text() {
        let reply = retriever().answer("can I get my money back if I cancel", &[]);
        assert!(reply.contains("Full refund within 7 days"));
    }

    #[test]
    fn feature_question_for_pro_lists_its_contents() {
        let reply = retriever().answer("what features does the pro tier offer", &[]);
        assert!(reply.contains("Pro Plan"));
        assert!(reply.contains("AI captions"));
        assert!(reply.contains("$99/month"));
        assert!(!reply.contains("$29/month"));
    }

    #[test]
    fn capability_question_gets_fixed_summary() {
        let reply = retriever().answer("what can you do", &[]);
        assert!(reply.contains("I can help you with"));
        assert!(reply.contains("Signing up"));
    }

    #[test]
    fn unrecognized_question_gets_clarification_request() {
        let reply = retriever().answer("tell me a joke", &[]);
        assert!(reply.contains("Could you please clarify"));
    }
}
