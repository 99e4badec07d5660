use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use copyloop::cli::{content, patterns, prefs, rate, recommend, template};
use copyloop::config::Config;
use copyloop::learning::RecommendationQuery;
use copyloop::model::{LearningIntensity, Niche, Platform, TemplateType};
use copyloop::store::{PreferencesPatch, RatingInput, Store};
use copyloop::templates::{TemplateContext, TemplateResolver};

#[derive(Parser)]
#[command(name = "copyloop")]
#[command(version)]
#[command(about = "Rate generated marketing copy, mine style patterns and resolve prompt templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "copyloop.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generated content management
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },

    /// Rate a piece of content (1-100)
    Rate {
        /// Content ID
        content_id: i64,
        /// Rating user (omit for an anonymous rating)
        #[arg(short, long)]
        user: Option<String>,
        #[arg(long)]
        overall: Option<i64>,
        #[arg(long)]
        instagram: Option<i64>,
        #[arg(long)]
        tiktok: Option<i64>,
        #[arg(long)]
        youtube: Option<i64>,
        #[arg(long)]
        twitter: Option<i64>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show the rating for a piece of content
    Rating {
        /// Content ID
        content_id: i64,
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Store an AI evaluation (sub-scores 1-10)
    Evaluate {
        /// Content ID
        content_id: i64,
        /// Evaluator model name
        #[arg(short, long)]
        model: String,
        /// JSON file with scores and justifications
        #[arg(long, conflicts_with_all = ["virality", "clarity", "persuasiveness", "creativity"])]
        file: Option<String>,
        #[arg(long, required_unless_present = "file")]
        virality: Option<i64>,
        #[arg(long, required_unless_present = "file")]
        clarity: Option<i64>,
        #[arg(long, required_unless_present = "file")]
        persuasiveness: Option<i64>,
        #[arg(long, required_unless_present = "file")]
        creativity: Option<i64>,
        #[arg(long)]
        needs_revision: bool,
        #[arg(long)]
        suggestions: Option<String>,
    },

    /// Learned pattern management
    Patterns {
        #[command(subcommand)]
        command: PatternCommands,
    },

    /// Recommend a writing style from rated content
    Recommend {
        #[command(flatten)]
        query: QueryArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Condensed style hints from content rated 85+
    Style {
        #[command(flatten)]
        query: QueryArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// User learning preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Resolve a prompt template
    Template {
        #[arg(short, long)]
        niche: Niche,
        /// Template type (caption, seo_blog, short_video, ...)
        #[arg(short = 't', long = "type")]
        template_type: TemplateType,
        #[arg(short, long)]
        product: String,
        #[arg(long, default_value = "friendly")]
        tone: String,
        #[arg(long, default_value = "")]
        trend: String,
    },
}

#[derive(Subcommand)]
enum ContentCommands {
    /// Record a generated piece of content
    Add {
        #[arg(short, long)]
        niche: String,
        /// Content type (caption, seo_blog, short_video, ...)
        #[arg(short = 't', long = "type")]
        content_type: String,
        #[arg(long)]
        tone: String,
        #[arg(short, long)]
        product: String,
        /// Generated output text
        #[arg(long)]
        text: String,
        #[arg(long)]
        hook: Option<String>,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Show a piece of content with its ratings
    Show {
        /// Content ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum PatternCommands {
    /// Mine rated content into patterns
    Extract {
        /// Minimum overall rating (defaults to patterns.min_rating)
        #[arg(long)]
        min_rating: Option<i64>,
        /// Print only, do not store
        #[arg(long)]
        dry_run: bool,
    },
    /// List stored patterns
    List {
        #[arg(short, long)]
        niche: Option<String>,
        /// Include inactive patterns
        #[arg(long)]
        all: bool,
    },
    /// Record that a pattern was applied to a piece of content
    Apply {
        /// Pattern ID prefix or name
        pattern: String,
        /// Content ID
        content_id: i64,
        /// Application strength (0-1)
        #[arg(long, default_value_t = 1.0)]
        strength: f64,
        /// Modified attributes (tone, hook, ...)
        #[arg(long = "attr")]
        attributes: Vec<String>,
    },
    /// Deactivate a stored pattern
    Deactivate {
        /// Pattern ID prefix or name
        pattern: String,
    },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Show preferences (creates defaults on first use)
    Show {
        #[arg(short, long)]
        user: String,
    },
    /// Update preferences
    Set {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        smart_learning: Option<bool>,
        #[arg(long)]
        intensity: Option<LearningIntensity>,
        #[arg(long)]
        min_overall: Option<i64>,
        #[arg(long)]
        min_platform: Option<i64>,
        /// Personalized weights as JSON
        #[arg(long)]
        weights: Option<String>,
    },
}

#[derive(clap::Args)]
struct QueryArgs {
    #[arg(short, long)]
    user: String,
    #[arg(short, long)]
    niche: Niche,
    #[arg(short = 't', long = "type")]
    template_type: Option<TemplateType>,
    #[arg(long)]
    tone: Option<String>,
    #[arg(long)]
    platform: Option<Platform>,
}

impl QueryArgs {
    fn query(&self) -> RecommendationQuery<'_> {
        RecommendationQuery {
            user_id: &self.user,
            niche: self.niche,
            template_type: self.template_type,
            tone: self.tone.as_deref(),
            platform: self.platform,
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config)?;
    init_logging(&config);

    // Initialize store
    let store = Store::open(&config.database_path())?;

    match cli.command {
        Commands::Content { command } => match command {
            ContentCommands::Add {
                niche,
                content_type,
                tone,
                product,
                text,
                hook,
                user,
                model,
            } => {
                let new = content::new_content(
                    &niche,
                    &content_type,
                    tone,
                    product,
                    text,
                    hook,
                    user,
                    model,
                )?;
                content::add(&store, new)?;
            }
            ContentCommands::Show { id } => {
                content::show(&store, id)?;
            }
        },
        Commands::Rate {
            content_id,
            user,
            overall,
            instagram,
            tiktok,
            youtube,
            twitter,
            notes,
        } => {
            let input = RatingInput {
                overall_rating: overall,
                instagram_rating: instagram,
                tiktok_rating: tiktok,
                youtube_rating: youtube,
                twitter_rating: twitter,
                notes,
            };
            rate::rate(&store, content_id, user, input)?;
        }
        Commands::Rating { content_id, user } => {
            rate::show(&store, content_id, user)?;
        }
        Commands::Evaluate {
            content_id,
            model,
            file,
            virality,
            clarity,
            persuasiveness,
            creativity,
            needs_revision,
            suggestions,
        } => match (file, virality, clarity, persuasiveness, creativity) {
            (Some(path), ..) => {
                rate::evaluate_from_file(&store, content_id, &model, &path)?;
            }
            (None, Some(v), Some(c), Some(p), Some(cr)) => {
                rate::evaluate(
                    &store,
                    content_id,
                    &model,
                    [v, c, p, cr],
                    needs_revision,
                    suggestions,
                )?;
            }
            _ => anyhow::bail!("Provide --file or all four sub-scores"),
        },
        Commands::Patterns { command } => match command {
            PatternCommands::Extract {
                min_rating,
                dry_run,
            } => {
                let min_rating = min_rating.unwrap_or(config.patterns.min_rating);
                patterns::extract(&store, min_rating, config.patterns.auto_store && !dry_run)?;
            }
            PatternCommands::List { niche, all } => {
                patterns::list(&store, niche, all)?;
            }
            PatternCommands::Apply {
                pattern,
                content_id,
                strength,
                attributes,
            } => {
                patterns::apply(&store, &pattern, content_id, strength, attributes)?;
            }
            PatternCommands::Deactivate { pattern } => {
                patterns::deactivate(&store, &pattern)?;
            }
        },
        Commands::Recommend { query, json } => {
            recommend::run(&store, &query.query(), json)?;
        }
        Commands::Style { query, json } => {
            recommend::style(&store, &query.query(), json)?;
        }
        Commands::Prefs { command } => match command {
            PrefsCommands::Show { user } => {
                prefs::show(&store, &user)?;
            }
            PrefsCommands::Set {
                user,
                smart_learning,
                intensity,
                min_overall,
                min_platform,
                weights,
            } => {
                let patch = PreferencesPatch {
                    use_smart_learning: smart_learning,
                    learning_intensity: intensity,
                    min_overall_rating: min_overall,
                    min_platform_rating: min_platform,
                    personalized_weights: weights
                        .map(|w| serde_json::from_str(&w))
                        .transpose()?,
                };
                prefs::set(&store, &user, patch)?;
            }
        },
        Commands::Template {
            niche,
            template_type,
            product,
            tone,
            trend,
        } => {
            let resolver = TemplateResolver::new(config.template_source());
            let context = TemplateContext {
                product: &product,
                tone: &tone,
                trend_context: &trend,
            };
            template::run(&resolver, niche, template_type, &context)?;
        }
    }

    Ok(())
}
