//! Plain-text rendering of a `SessionView`.

use std::fmt::Display;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use weatherlens_core::{
    AirQualityReading, ForecastDay, Insight, InsightTone, SessionView, Theme, WeatherSnapshot,
    units::{approximate_us_aqi, day_name, format_date, format_time},
};

/// Pollutants shown on the air-quality card.
const KEY_POLLUTANTS: usize = 4;

struct Glyphs {
    degree: &'static str,
    rule: char,
    bullet: &'static str,
    positive: &'static str,
    warning: &'static str,
    neutral: &'static str,
    separator: &'static str,
}

const RICH: Glyphs = Glyphs {
    degree: "°",
    rule: '─',
    bullet: "•",
    positive: "✔",
    warning: "⚠",
    neutral: "ℹ",
    separator: "·",
};

const PLAIN: Glyphs = Glyphs {
    degree: "",
    rule: '-',
    bullet: "*",
    positive: "+",
    warning: "!",
    neutral: "i",
    separator: "-",
};

/// Turns dashboard state into terminal text.
pub struct Renderer<Tz: TimeZone = Local> {
    theme: Theme,
    tz: Tz,
}

impl Renderer<Local> {
    pub fn new(theme: Theme) -> Self {
        Self::with_timezone(theme, Local)
    }
}

impl<Tz> Renderer<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn with_timezone(theme: Theme, tz: Tz) -> Self {
        Self { theme, tz }
    }

    fn glyphs(&self) -> &'static Glyphs {
        match self.theme {
            Theme::Rich => &RICH,
            Theme::Plain => &PLAIN,
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    pub fn render(&self, view: &SessionView) -> String {
        self.render_on(view, self.today())
    }

    /// Render with an explicit "today" for forecast day names.
    pub fn render_on(&self, view: &SessionView, today: NaiveDate) -> String {
        let mut out = self.header();

        match (&view.weather, &view.air_quality) {
            (None, _) if view.loading => out.push_str(&self.loading()),
            (None, _) => out.push_str(&self.error_state(view)),
            (Some(weather), Some(air)) => {
                if let Some(error) = &view.error {
                    out.push_str(&format!("{} {}\n\n", self.glyphs().warning, error.message));
                }
                if view.loading {
                    out.push_str(&self.loading());
                }
                out.push_str(&self.current_card(weather));
                out.push_str(&self.air_quality_card(air));
                out.push_str(&self.forecast_card(&view.forecast, today));
                out.push_str(&self.insights_card(&view.insights));
                out.push_str(&self.footer(weather));
            }
            (Some(_), None) => {}
        }

        out
    }

    fn header(&self) -> String {
        format!(
            "WeatherLens {} Human-centric weather insights\n\n",
            self.glyphs().separator
        )
    }

    fn title(&self, title: &str) -> String {
        let rule: String = std::iter::repeat_n(self.glyphs().rule, title.chars().count()).collect();
        format!("{title}\n{rule}\n")
    }

    pub fn loading(&self) -> String {
        "Loading weather data...\n\n".to_string()
    }

    /// Error page shown while there is no snapshot. Empty when there is no error.
    pub fn error_state(&self, view: &SessionView) -> String {
        let Some(error) = &view.error else {
            return String::new();
        };

        let title = if view.is_location_error() {
            "Location Access Required"
        } else {
            "Something went wrong"
        };

        let mut out = self.title(title);
        out.push_str(&format!("{}\n\n", error.message));
        if view.is_location_error() {
            out.push_str("Or search for a city with `weatherlens show --city <NAME>`.\n\n");
        }
        out
    }

    pub fn current_card(&self, weather: &WeatherSnapshot) -> String {
        let g = self.glyphs();
        let current = &weather.current;
        let location = format!("{}, {}", weather.location.name, weather.location.country);

        let mut out = self.title(&location);
        out.push_str(&format!(
            "{}{}C  {}\nFeels like {}{}C\n\n",
            current.temperature_c,
            g.degree,
            current.description,
            current.feels_like_c,
            g.degree
        ));

        let mut details = vec![
            ("Humidity", format!("{}%", current.humidity_pct)),
            (
                "Wind",
                format!("{} km/h {}", current.wind_speed_kmh, current.wind_direction),
            ),
        ];
        if let Some(visibility) = current.visibility_km {
            details.push(("Visibility", format!("{visibility} km")));
        }
        details.push(("Pressure", format!("{} hPa", current.pressure_hpa)));
        details.push(("Clouds", format!("{}%", current.cloud_cover_pct)));
        if let Some(uv) = current.uv_index {
            details.push(("UV Index", format!("{uv:.1}")));
        }
        details.push(("Sunrise", format_time(weather.sun.sunrise, &self.tz)));
        details.push(("Sunset", format_time(weather.sun.sunset, &self.tz)));

        for (label, value) in details {
            out.push_str(&format!("  {label:<11}{value}\n"));
        }
        out.push('\n');
        out
    }

    pub fn air_quality_card(&self, air: &AirQualityReading) -> String {
        let g = self.glyphs();
        let category = air.category;

        let mut out = self.title("Air Quality");
        out.push_str(&format!(
            "AQI {} ({})\n{}\n",
            approximate_us_aqi(air.index),
            category.label(),
            category.health_message()
        ));

        for (name, value) in air.components.entries().iter().take(KEY_POLLUTANTS) {
            out.push_str(&format!("  {name:<6}{value:>7.1} ug/m3\n"));
        }

        let (icon, headline, advice) = if category.is_outdoor_friendly() {
            (
                g.positive,
                "Safe for Outdoor Activities",
                "Great day for outdoor exercise and activities. Enjoy the fresh air!",
            )
        } else {
            (
                g.warning,
                "Take Precautions",
                "Consider reducing outdoor activities. Wear a mask if going outside.",
            )
        };
        out.push_str(&format!("{icon} {headline}: {advice}\n\n"));
        out
    }

    pub fn forecast_card(&self, days: &[ForecastDay], today: NaiveDate) -> String {
        if days.is_empty() {
            return String::new();
        }

        let g = self.glyphs();
        let mut out = self.title("5-Day Forecast");

        for day in days {
            out.push_str(&format!(
                "  {:<9}{:>4}{d}/{:>3}{d}  {:<13}{:>4}%  {:>3} km/h",
                day_name(day.date, today, &self.tz),
                day.temp_max_c,
                day.temp_min_c,
                day.condition,
                day.humidity_pct,
                day.wind_speed_kmh,
                d = g.degree,
            ));
            if day.precipitation_chance_pct > 0 {
                out.push_str(&format!("  rain {}%", day.precipitation_chance_pct));
            }
            out.push('\n');
        }
        out.push('\n');
        out
    }

    pub fn insights_card(&self, insights: &[Insight]) -> String {
        let g = self.glyphs();
        let mut out = self.title("Insights");

        for insight in insights {
            let icon = match insight.tone {
                InsightTone::Positive => g.positive,
                InsightTone::Warning => g.warning,
                InsightTone::Neutral => g.neutral,
            };
            out.push_str(&format!(
                "{} {icon} {}\n    {}\n",
                g.bullet, insight.title, insight.message
            ));
        }
        out.push('\n');
        out
    }

    fn footer(&self, weather: &WeatherSnapshot) -> String {
        format!(
            "Data provided by OpenWeatherMap (https://openweathermap.org)\n\
             Last updated: {} {}\n",
            format_date(weather.observed_at, &self.tz),
            format_time(weather.observed_at, &self.tz)
        )
    }
}
