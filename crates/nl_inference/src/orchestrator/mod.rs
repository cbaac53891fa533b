//! Per-capability analysis pipelines: fetch, clean, call the model gateway,
//! aggregate and shape the response.

use std::sync::Arc;

use nl_core::text::{self, Tokenizer, WhitespaceTokenizer};
use nl_core::{
    AnalysisResult, Answer, ArticleContent, ArticleFetcher, Backend, BiasReport, ChatMessage,
    ChatModel, Error, ImageVerdict, InferenceModel, NewsLink, NewsLookup, QaList, RelatedNews,
    Result, SentimentScore, Summary, SummaryParams,
};
use tracing::{debug, info, warn};
use url::Url;

mod fallback;
pub mod prompts;

pub use fallback::FallbackPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Capability {
    Summarize,
    Sentiment,
    Bias,
    Question,
    CommonQuestions,
    GptAnswer,
    DetectImage,
    FetchNews,
}

/// Per-request inputs beyond the article URL.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub question: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub fallback: FallbackPolicy,
    pub summary: SummaryParams,
    pub sentiment_chunk_tokens: usize,
    pub classifier_max_tokens: usize,
    pub qa_context_chars: usize,
    pub qa_max_length: usize,
    pub llm_max_words: usize,
    pub max_common_questions: usize,
    pub news_limit: usize,
    pub default_region: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::default(),
            summary: SummaryParams::default(),
            sentiment_chunk_tokens: 512,
            classifier_max_tokens: 512,
            qa_context_chars: 512,
            qa_max_length: 150,
            llm_max_words: 2000,
            max_common_questions: 3,
            news_limit: 5,
            default_region: "us".to_string(),
        }
    }
}

/// Keeps backend errors as they are and attributes anything else to `backend`.
fn via(backend: Backend) -> impl FnOnce(Error) -> Error {
    move |e| match e {
        Error::Backend { .. } => e,
        other => Error::backend(backend, other),
    }
}

fn as_fetch_error(e: Error) -> Error {
    match e {
        Error::Fetch(_) => e,
        other => Error::Fetch(other.to_string()),
    }
}

fn require_question(question: Option<&str>) -> Result<&str> {
    question
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::InvalidInput("question must not be empty".to_string()))
}

fn soft_lookup(what: &str, result: Result<Vec<NewsLink>>) -> Vec<NewsLink> {
    match result {
        Ok(links) => links,
        Err(e) => {
            warn!("⚠️ News lookup ({}) failed, continuing without it: {}", what, e);
            Vec::new()
        }
    }
}

pub struct Orchestrator {
    fetcher: Arc<dyn ArticleFetcher>,
    model: Arc<dyn InferenceModel>,
    llm: Arc<dyn ChatModel>,
    news: Arc<dyn NewsLookup>,
    tokenizer: Arc<dyn Tokenizer>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("model", &self.model.name())
            .field("llm", &self.llm.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn ArticleFetcher>,
        model: Arc<dyn InferenceModel>,
        llm: Arc<dyn ChatModel>,
        news: Arc<dyn NewsLookup>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            model,
            llm,
            news,
            tokenizer: Arc::new(WhitespaceTokenizer),
            settings,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs one capability and returns its payload.
    pub async fn run(
        &self,
        capability: Capability,
        url: &str,
        options: &PipelineOptions,
    ) -> Result<AnalysisResult> {
        let question = options.question.as_deref();
        let result = match capability {
            Capability::Summarize => AnalysisResult::Summary(self.summarize(url).await?),
            Capability::Sentiment => AnalysisResult::SentimentScore(self.sentiment(url).await?),
            Capability::Bias => AnalysisResult::BiasReport(self.bias(url).await?),
            Capability::Question => {
                AnalysisResult::Answer(self.answer_question(url, require_question(question)?).await?)
            }
            Capability::CommonQuestions => AnalysisResult::QaList(self.common_questions(url).await?),
            Capability::GptAnswer => {
                AnalysisResult::Answer(self.gpt_answer(url, require_question(question)?).await?)
            }
            Capability::DetectImage => AnalysisResult::ImageVerdict(self.detect_image(url).await?),
            Capability::FetchNews => {
                AnalysisResult::RelatedNews(self.related_news(url, options.region.as_deref()).await?)
            }
        };
        Ok(result)
    }

    /// Downloads and cleans the article behind `url`.
    pub async fn fetch(&self, url: &str) -> Result<ArticleContent> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| Error::Fetch(format!("invalid URL {:?}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Fetch(format!("unsupported URL scheme: {}", parsed.scheme())));
        }

        info!("📰 Fetching article: {}", parsed);
        let fetched = self
            .fetcher
            .fetch_article(parsed.as_str())
            .await
            .map_err(as_fetch_error)?;
        let article = ArticleContent::from(fetched);
        debug!(
            "Cleaned article {:?}: {} -> {} chars, {} images",
            article.title,
            article.raw_text.len(),
            article.cleaned_text.len(),
            article.image_urls.len()
        );
        Ok(article)
    }

    pub async fn summarize(&self, url: &str) -> Result<Summary> {
        let article = self.fetch(url).await?;
        let limit = Backend::Summarizer.max_input_tokens().unwrap_or(usize::MAX);
        let input = text::truncate_tokens(&article.cleaned_text, limit, self.tokenizer.as_ref());

        info!("🤖 Summarizing with {}", self.model.name());
        let summary = self
            .model
            .summarize(&input, &self.settings.summary)
            .await
            .map_err(via(Backend::Summarizer))?;

        Ok(Summary {
            title: article.title,
            summary,
        })
    }

    pub async fn sentiment(&self, url: &str) -> Result<SentimentScore> {
        let article = self.fetch(url).await?;
        let average_sentiment_score = self.average_sentiment(&article.cleaned_text).await?;
        Ok(SentimentScore {
            average_sentiment_score,
        })
    }

    /// Mean star rating over every chunk, in order. Chunks are not weighted by length.
    pub async fn average_sentiment(&self, cleaned_text: &str) -> Result<f64> {
        let chunk_tokens = self
            .settings
            .sentiment_chunk_tokens
            .min(Backend::Sentiment.max_input_tokens().unwrap_or(usize::MAX));
        let chunks = text::chunk(cleaned_text, chunk_tokens, self.tokenizer.as_ref())?;
        info!("📑 Scoring sentiment over {} chunks", chunks.len());

        let mut scores = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let result = self
                .model
                .classify(Backend::Sentiment, &chunk.text)
                .await
                .map_err(via(Backend::Sentiment))?;
            let stars = text::star_rating(&result.label).ok_or_else(|| {
                Error::backend(Backend::Sentiment, format!("unexpected label {:?}", result.label))
            })?;
            debug!("Chunk {} ({} tokens): {} stars", chunk.index, chunk.token_count, stars);
            scores.push(f64::from(stars));
        }

        text::average(&scores)
    }

    pub async fn bias(&self, url: &str) -> Result<BiasReport> {
        let article = self.fetch(url).await?;
        let input = text::truncate_tokens(
            &article.cleaned_text,
            self.settings.classifier_max_tokens,
            self.tokenizer.as_ref(),
        );

        let fact_opinion = self
            .model
            .classify(Backend::FactOpinion, &input)
            .await
            .map_err(via(Backend::FactOpinion))?;
        let bias = self
            .model
            .classify(Backend::Bias, &input)
            .await
            .map_err(via(Backend::Bias))?;
        let explanation = prompts::bias_explanation(text::star_rating(&bias.label));

        let llm_input = text::truncate_tokens(
            &article.cleaned_text,
            self.settings.llm_max_words,
            &WhitespaceTokenizer,
        );
        let gpt_bias_analysis = self.chat(&prompts::bias(&llm_input)).await?;

        Ok(BiasReport {
            fact_opinion_label: fact_opinion.label,
            fact_opinion_confidence: text::round2(fact_opinion.score),
            distilbert_bias_label: format!("{} ({})", bias.label, explanation),
            distilbert_bias_confidence: text::round2(bias.score),
            gpt_bias_analysis,
        })
    }

    /// Answers with the question-answering model, escalating to the LLM at most once.
    pub async fn answer_question(&self, url: &str, question: &str) -> Result<Answer> {
        let question = require_question(Some(question))?;
        let article = self.fetch(url).await?;

        let mut answer = self.ask_qa_model(&article.cleaned_text, question).await?;
        if self.settings.fallback.decide(&answer).should_escalate() {
            info!("↪️ Escalating to {}: {}", self.llm.name(), question);
            answer = self.ask_llm(&article.cleaned_text, question).await?;
        }

        Ok(Answer {
            question: question.to_string(),
            answer,
        })
    }

    /// LLM-generated reader questions, answered by the question-answering model.
    pub async fn common_questions(&self, url: &str) -> Result<QaList> {
        let article = self.fetch(url).await?;
        let max_questions = self.settings.max_common_questions;

        let generated = self
            .chat(&prompts::common_questions(&article.cleaned_text, max_questions))
            .await?;
        let questions = prompts::parse_questions(&generated, max_questions);
        info!("❓ Answering {} generated questions", questions.len());

        let mut questions_and_answers = Vec::with_capacity(questions.len());
        for question in questions {
            let answer = self.ask_qa_model(&article.cleaned_text, &question).await?;
            let answer = if answer.is_empty() {
                prompts::DEFERRED_ANSWER.to_string()
            } else if self.settings.fallback.decide(&answer).should_escalate() {
                format!("{}{}", prompts::NOT_COVERED_PREFIX, answer)
            } else {
                answer
            };
            questions_and_answers.push(Answer { question, answer });
        }

        Ok(QaList {
            questions_and_answers,
        })
    }

    pub async fn gpt_answer(&self, url: &str, question: &str) -> Result<Answer> {
        let question = require_question(Some(question))?;
        let article = self.fetch(url).await?;
        let answer = self.ask_llm(&article.cleaned_text, question).await?;
        Ok(Answer {
            question: question.to_string(),
            answer,
        })
    }

    pub async fn detect_image(&self, url: &str) -> Result<ImageVerdict> {
        let article = self.fetch(url).await?;
        let image_url = article
            .lead_image()
            .ok_or_else(|| Error::Fetch("article contains no images".to_string()))?
            .to_string();

        info!("🖼️ Inspecting image: {}", image_url);
        let image = self
            .fetcher
            .fetch_image(&image_url)
            .await
            .map_err(as_fetch_error)?;

        let deepfake = self
            .model
            .classify_image(Backend::Deepfake, &image)
            .await
            .map_err(via(Backend::Deepfake))?;
        let manipulation = self
            .model
            .classify_image(Backend::Manipulation, &image)
            .await
            .map_err(via(Backend::Manipulation))?;

        Ok(ImageVerdict {
            image_url,
            deepfake_detection: deepfake.into(),
            manipulation_detection: manipulation.into(),
        })
    }

    /// Related coverage for the article's main topic plus the latest regional headlines.
    /// Lookup failures degrade to empty lists.
    pub async fn related_news(&self, url: &str, region: Option<&str>) -> Result<RelatedNews> {
        let article = self.fetch(url).await?;
        let llm_input = text::truncate_tokens(
            &article.cleaned_text,
            self.settings.llm_max_words,
            &WhitespaceTokenizer,
        );
        let main_topic = prompts::tidy_topic(&self.chat(&prompts::main_topic(&llm_input)).await?);
        if main_topic.is_empty() {
            return Err(Error::backend(Backend::Llm, "no topic returned"));
        }

        let region = region
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(self.settings.default_region.as_str());
        let limit = self.settings.news_limit;
        info!("🔍 Looking up news for topic {:?} and region {}", main_topic, region);

        let topic_articles = soft_lookup("topic", self.news.search_by_topic(&main_topic, limit).await);
        let latest_articles = soft_lookup("latest", self.news.latest_by_region(region, limit).await);

        Ok(RelatedNews {
            main_topic,
            topic_articles,
            latest_articles,
        })
    }

    async fn ask_qa_model(&self, cleaned_text: &str, question: &str) -> Result<String> {
        let context = text::truncate_chars(cleaned_text, self.settings.qa_context_chars);
        let answer = self
            .model
            .generate(
                Backend::QuestionAnswering,
                &prompts::article_question(context, question),
                self.settings.qa_max_length,
            )
            .await
            .map_err(via(Backend::QuestionAnswering))?;
        Ok(answer.trim().to_string())
    }

    async fn ask_llm(&self, cleaned_text: &str, question: &str) -> Result<String> {
        self.chat(&prompts::llm_answer(cleaned_text, question)).await
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let messages = [ChatMessage::system(prompts::SYSTEM), ChatMessage::user(prompt)];
        self.llm.chat(&messages).await.map_err(via(Backend::Llm))
    }
}
