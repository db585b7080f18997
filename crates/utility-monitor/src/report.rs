//! Plain-text rendering of the session for the terminal.

use std::fmt::Write;

use meter_core::formatting::{
    format_date_br, format_number, format_quantity, format_variation, TrendDirection,
};
use meter_core::models::SourceCategory;
use meter_data::analysis::AnalysisResult;
use meter_runtime::session::SessionState;

/// Which sections of the report to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Records,
    Monthly,
    Summary,
    Trend,
    All,
}

impl View {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "records" => Some(View::Records),
            "monthly" => Some(View::Monthly),
            "summary" => Some(View::Summary),
            "trend" => Some(View::Trend),
            "all" => Some(View::All),
            _ => None,
        }
    }
}

/// Render `view` of `state`.
pub fn render(state: &SessionState, view: View) -> String {
    let Some(analysis) = state.analysis() else {
        return "Nenhum dado disponível.\n".to_string();
    };

    let mut out = String::new();
    if matches!(view, View::Summary | View::All) {
        render_summary(&mut out, analysis);
    }
    if matches!(view, View::Monthly | View::All) {
        render_monthly(&mut out, analysis);
    }
    if matches!(view, View::Trend | View::All) {
        render_trend(&mut out, analysis);
    }
    if matches!(view, View::Records | View::All) {
        render_records(&mut out, analysis);
    }
    out
}

/// `"+12.5% vs mês anterior"`, shown under a source's daily average.
pub fn insight(variation: f64) -> String {
    format!(
        "{} {} vs mês anterior",
        TrendDirection::of(variation).arrow(),
        format_variation(variation)
    )
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n== {title} ==");
}

fn render_summary(out: &mut String, analysis: &AnalysisResult) {
    heading(out, "Resumo");
    for source in [SourceCategory::Water, SourceCategory::Energy] {
        let daily = analysis.summary.daily(source);
        let _ = writeln!(
            out,
            "Média Diária - {:<8} {:>16}  ({} valores)",
            source.display_name(),
            format_quantity(daily.mean, 2, source.daily_unit()),
            daily.count_used
        );
        if daily.had_negative {
            let _ = writeln!(out, "  atenção: valores negativos na série");
        }
        if let Some(variation) = analysis.latest_variation(source) {
            let _ = writeln!(out, "  {}", insight(variation));
        }
    }
    for source in [SourceCategory::Water, SourceCategory::Energy] {
        let total = analysis.summary.total(source);
        let _ = writeln!(
            out,
            "Total {:<16} {:>16}  ({} registros)",
            source.display_name(),
            format_quantity(total.total, 2, source.unit()),
            total.records
        );
    }
}

fn render_monthly(out: &mut String, analysis: &AnalysisResult) {
    heading(out, "Análise Mensal");
    for source in SourceCategory::ALL {
        let buckets = analysis.monthly.source(source);
        if buckets.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} ({})", source.display_name(), source.provider());
        let _ = writeln!(
            out,
            "  {:<8} {:>12} {:>12} {:>7} {:>10} {:>10} {:>10} {:>12} {:>12}",
            "Mês", "Média/dia", "Total", "Dias", "Variação", "Maior", "Menor", "Leitura mín", "Leitura máx"
        );
        for (month, bucket) in buckets {
            let _ = writeln!(
                out,
                "  {:<8} {:>12} {:>12} {:>7} {:>8} {} {:>10} {:>10} {:>12} {:>12}",
                month.label(),
                format_number(bucket.avg_daily_delta, 2),
                format_number(bucket.delta_sum, 2),
                format!("{}/{}", bucket.positive_delta_count, bucket.count),
                format_variation(bucket.variation),
                TrendDirection::of(bucket.variation).arrow(),
                format_number(bucket.max_delta_or_zero(), 1),
                format_number(bucket.min_delta_or_zero(), 1),
                format_number(bucket.min_consumption_or_zero(), 2),
                format_number(bucket.max_consumption_or_zero(), 2),
            );
        }
    }
}

fn render_trend(out: &mut String, analysis: &AnalysisResult) {
    heading(out, "Tendência");
    let _ = writeln!(
        out,
        "  {:<8} {:>14} {:>9} {:>14} {:>9}",
        "Mês", "Energia/dia", "Var.", "Água/dia", "Var."
    );
    for point in &analysis.trend {
        let _ = writeln!(
            out,
            "  {:<8} {:>14} {:>9} {:>14} {:>9}",
            point.month.label(),
            format_number(point.energy_avg_delta, 2),
            format_variation(point.energy_variation),
            format_number(point.water_avg_delta, 2),
            format_variation(point.water_variation),
        );
    }

    heading(out, "Consumo Mensal");
    for total in &analysis.monthly_totals {
        let _ = writeln!(
            out,
            "  {:<8} {:>18} {:>18}",
            total.month.label(),
            format_quantity(total.energy, 2, SourceCategory::Energy.unit()),
            format_quantity(total.water, 2, SourceCategory::Water.unit()),
        );
    }
}

fn render_records(out: &mut String, analysis: &AnalysisResult) {
    heading(out, "Registros");
    let _ = writeln!(
        out,
        "  {:<10} {:<18} {:>14} {:>10} {:<5}",
        "Data", "Origem", "Consumo", "Dif_dia", "Un."
    );
    for record in &analysis.records {
        let _ = writeln!(
            out,
            "  {:<10} {:<18} {:>14} {:>10} {:<5}",
            format_date_br(record.date),
            record.source.origin_label(),
            format_number(record.consumption, 2),
            format_number(record.daily_delta, 2),
            record.source.unit(),
        );
    }
}
