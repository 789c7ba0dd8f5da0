//! Static banner fragments and RTF header anchoring
//!
//! Banners are plain string literals, one per leaf content type. RTF is
//! the delicate case: we never attempt a full RTF parse (that is an
//! explicit non-goal), we only locate the opening `{\rtfN` control word
//! and the run of header control words that follow it (font table, color
//! table, stylesheet, info group, ...) and splice the banner fragment in
//! immediately after. If that anchor can't be found, nothing is inserted
//! rather than risking corruption of an unfamiliar RTF dialect.

use std::sync::LazyLock;

use regex::Regex;

/// Plain-text banner, prepended verbatim to `text/plain` (and empty
/// content-type) leaf bodies
pub const PLAIN_TEXT_BANNER: &str = "** WARNING - EXTERNAL MESSAGE **\nThis e-mail originated outside of Konrad Technologies.\nBe careful when opening links or attachments, unless you recognize the sender and know the content is safe!\n-----\n\n";

/// HTML banner fragment, prepended verbatim to `text/html` leaf bodies
pub const HTML_BANNER: &str = "<!DOCTYPE html>\n<html><head></head>\n<body>\n<h3>WARNING - External Message</h3>\n<p>This e-mail originated outside of Konrad Technologies.<br>Be careful when opening links or attachments, unless you recognize the sender and know the content is safe!</p>\n<hr/>\n</body>\n</html>\n";

/// RTF banner paragraph, spliced in immediately after the RTF header run
const RTF_BANNER: &str = "\n{\\pard \\ql \\b \\fs32 WARNING - External Message\\par}\n{\\pard \\ql This e-mail originated outside of Konrad Technologies.\\par}\n{\\pard \\ql Be careful when opening links or attachments, unless you recognize the sender and know the content is safe!\\par}\n{\\pard \\qc \\emdash\\emdash\\emdash\\emdash\\emdash\\par}\n";

/// Matches the RTF preamble: the opening `{\rtfN` plus the run of header
/// control words/groups that conventionally follow it (font table, color
/// table, stylesheet, info group, generator, and many single-token
/// document-level control words).
static RTF_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"({\\rtf[0-9])\s*(\\ansicpg[0-9]+|\\ansi|\\mac|\\pc|\\pca|\\fbidis|\\fromtext|\\fromhtml[0-9]?|\\uc[0-9]|\\deff[0-9]+|\\adeff[0-9]+|\\stshfdbch[0-9]+|\\stshfloch[0-9]+|\\stshfhich[0-9]+|\\stshfbi[0-9]+|\\deflang[0-9]+|\\deflangfe[0-9]+|\\adeflang[0-9]+|({\\fonttbl\s*({?(\s*\\f.+?;\s*)+}?\s*)*})|({\\filetbl\s*({\\.+?;})+\s*})|({\\colortbl\s*.+?\s*;})|({\\stylesheet\s*({\s*\\.+?;\s*})+\s*})|({(\\\*)?(\\latentstyles|\\lsdstimax[0-9]+|\\lsdlockeddef[0-9]+|\\lsdsemihiddendef[0-9]+|\\lsdunhideuseddef[0-9]+|\\lsdqformatdef[0-9]+|\\lsdprioritydef[0-9]+)+.*?})|({(\\\*)?\\(listtable|listoverridetable)\s*.+?\s*({\s*\\.+?;?\s*})+\s*})|({(\\\*)?\\revtbl\s*({\s*\\.+?;?\s*})+\s*})|({(\\\*)?\\pgptbl\s*({\s*\\pgp.+?;?\s*})+\s*})|({(\\\*)?\\rsidtbl(\s*\\rsid[0-9]+\s*)+})|({(\\\*)?\\mmathPr(\s*\\m.+?\s*)+})|({(\\\*)?\\generator\s*.+?\s*;?})|({\\info\s*.+?\s*({\s*\\.+?;?\s*})+\s*})|({(\\\*)?\\userprops\s*({\s*\\.+?;?\s*})*\s*})|({(\\\*)?\\xmlnstbl\s*.+?\s*({\s*\\xmlns.+?;?\s*})+\s*;?})|({(\\\*)?\\defchp\s*.+?\s*})|({(\\\*)?\\defpap\s*.+?\s*;?})|({(\\\*)?\\pgdscno[0-9]?})|\\noqfpromote|\\aenddoc|\\aendnotes|\\afelev|\\aftnbjaftncn|\\aftnnalc|\\aftnnar|\\aftnnauc|\\aftnnchi|\\aftnnchosung|\\aftnncnum|\\aftnndbar|\\aftnndbnum|\\aftnndbnumd|\\aftnndbnumk|\\aftnndbnumt|\\aftnnganada|\\aftnngbnum|\\aftnngbnumd|\\aftnngbnumk|\\aftnngbnuml|\\aftnnrlc|\\aftnnruc|\\aftnnzodiac|\\aftnnzodiacd|\\aftnnzodiacl|\\aftnrestart|\\aftnrstcont|\\aftnstart[0-9]+|\\aftntj|\\allowfieldendsel|\\allprot|\\alntblind|\\annotprot|\\ApplyBrkRules|\\asianbrkrule|\\autofmtoverride|\\bdbfhdr|\\bdrrlswsix|\\bookfold|\\bookfoldrev|\\bookfoldsheets[0-9]+|\\brdrart[0-9]+|\\brkfrm|\\cachedcolbal|\\cts[0-9]+|\\cvmme|\\defformat|\\deftab[0-9]+|\\deleted|\\dghorigin[0-9]+|\\dghshow[0-9]+|\\dghspace[0-9]+|\\dgmargin|\\dgsnap|\\dgvorigin[0-9]+|\\dgvshow[0-9]+|\\dgvspace[0-9]+|\\dntblnsbdb|\\dntblnsbdbwid|\\dntultrlspc|\\doctemp|\\doctype[0-9]+|\\donotembedlingdata[0-9]+|\\donotembedsysfont[0-9]+|\\donotshowcomments|\\donotshowinsdel|\\donotshowmarkup|\\donotshowprops|\\dontadjustlineheightintable|\\enddoc|\\endnotes|\\enforceprot[0-9]+|\\expshrtn|\\facingp|\\felnbrelev|\\fet[0-9]+|\\forceupgrade|\\formdisp|\\formprot|\\formshade|\\fracwidth|\\ftnbj|\\ftnlytwnine|\\ftnnalc|\\ftnnar|\\ftnnauc|\\ftnnchi|\\ftnnchosung|\\ftnncnum|\\ftnndbar|\\ftnndbnum|\\ftnndbnumd|\\ftnndbnumk|\\ftnndbnumt|\\ftnnganada|\\ftnngbnum|\\ftnngbnumd|\\ftnngbnumk|\\ftnngbnuml|\\ftnnrlc|\\ftnnruc|\\ftnnzodiac|\\ftnnzodiacd|\\ftnnzodiacl|\\ftnrestart|\\ftnrstcont|\\ftnrstpg|\\ftnstart[0-9]+|\\ftntj|\\grfdocevents[0-9]+|\\gutter[0-9]+|\\gutterprl|\\horzdoc|\\htmautsp|\\hwelev|\\hyphauto[0-1]?|\\hyphcaps[0-1]?|\\hyphconsec[0-9]+|\\hyphhotz[0-9]+|\\ignoremixedcontent[0-9]+|\\ilfomacatclnup[0-9]+|\\indrlsweleven|\\jcompress|\\jexpand|\\jsksu|\\krnprsnet|\\ksulang[0-9]+|\\landscape|\\linestart[0-9]+|\\linkstyles|\\lnbrkrule|\\lnongrid|\\ltrdoc|\\ltrsect|\\lytcalctblwd|\\lytexcttp|\\lytprtmet|\\lyttblrtgr|\\makebackup|\\margb[0-9]+|\\margl[0-9]+|\\margmirror|\\margr[0-9]+|\\margt[0-9]+|\\msmcap|\\muser|\\newtblstyruls|\\noafcnsttbl|\\nobrkwrptbl|\\nocolbal|\\nocompatoptions|\\nocxsptable|\\noextrasprl|\\nofeaturethrottle[0-9]+|\\nogrowautofit|\\noindnmbrts|\\nojkernpunct|\\nolead|\\nolnhtadjtbl|\\nospaceforul|\\notabind|\\notbrkcnstfrctbl|\\notcvasp|\\notvatxbx|\\nouicompat|\\noultrlspc|\\noxlattoyen|\\ogutter[0-9]+|\\oldas|\\oldlinewrap|\\otblrul|\\paperh[0-9]+|\\paperw[0-9]+|\\pgbrdrb|\\pgbrdrfoot|\\pgbrdrhead|\\pgbrdrl|\\pgbrdropt[0-9]+|\\pgbrdrr|\\pgbrdrsnap|\\pgbrdrt|\\pgnstart[0-9]+|\\prcolbl|\\printdata|\\protend|\\protlevel[0-9]+|\\protstart|\\psover|\\psz[0-9]+|\\readonlyrecommended|\\readprot|\\relyonvml[0-9]+|\\remdttm|\\rempersonalinfo|\\revbar[0-9]+|\\revised|\\revisions|\\revprop[0-9]+|\\revprot|\\rsidroot[0-9]+|\\rtldoc|\\rtlgutter|\\saveinvalidxml[0-9]+|\\saveprevpict|\\shidden|\\showplaceholdtext[0-9]+|\\showxmlerrors[0-9]+|\\shp|\\snaptogridincell|\\spltpgpar|\\splytwnine|\\spriority[0-9]+|\\sprsbsp|\\sprslnsp|\\sprsspbf|\\sprstsm|\\sprstsp|\\ssemihidden[0-9]+|\\stylelock|\\stylelockbackcomp|\\stylelockenforced|\\stylelockqfset|\\stylelocktheme|\\stylesortmethod[0-9]+|\\subfontbysize|\\swpbdr|\\themelangcs[0-9]+|\\themelangfe[0-9]+|\\themelang[0-9]+|\\toplinepunct|\\trackformatting[0-9]+|\\trackmoves[0-9]+|\\transmf|\\truncatefontheight|\\truncex|\\tsd[0-9]+|\\twoonone|\\useltbaln|\\usenormstyforlist|\\usexform|\\utinl|\\validatexml[0-9]+|\\vertdoc|\\viewbksp[0-9]+|\\viewkind[0-9]+|\\viewnobound|\\viewscale[0-9]+|\\viewzk[0-9]+|\\widowctrl|\\wpjst|\\wpsp|\\wptab|\\wraptrsp|\\wrppunct|({(\\\*)?\\aftncn\s*.+?\s*({\s*\\.+?;?\s*})*\s*})|({(\\\*)?\\aftnsep\s*.+?\s*({\s*\\.+?;?\s*})*\s*})|({(\\\*)?\\aftnsepc\s*.+?\s*({\s*\\.+?;?\s*})*\s*})|({(\\\*)?\\ftncn\s*.+?\s*({\s*\\.+?;?\s*})*\s*})|({(\\\*)?\\ftnsep\s*.+?\s*({\s*\\.+?;?\s*})*\s*})|({(\\\*)?\\ftnsepc\s*.+?\s*({\s*\\.+?;?\s*})*\s*})|({(\\\*)?\\background.+?;?})|({(\\\*)?\\fchars.+?;?})|({(\\\*)?\\lchars.+?;?})|({(\\\*)?\\nextfile.+?;?})|({(\\\*)?\\private.+?;?})|({(\\\*)?\\template\s*(\S|(\\{)|(\\}))*})|({(\\\*)?\\wgrffmtfilter\s*[0-9a-fA-F]{4}})|({(\\\*)?\\windowcaption.+?;?})|({(\\\*)?\\writereservation.+?;?})|({(\\\*)?\\writereservhash.+?;?})|({(\\\*)?\\xform.+?;?})|\s+)*")
        .expect("rtf header anchor pattern is valid")
});

/// Insert the RTF banner immediately after the RTF preamble
///
/// If no `{\rtfN` anchor (followed by its header run) can be found, the
/// body is returned unchanged: corrupting an unfamiliar RTF dialect is
/// worse than skipping the banner.
pub fn insert_rtf_banner(body: &[u8]) -> Vec<u8> {
    let Ok(text) = std::str::from_utf8(body) else {
        return body.to_vec();
    };
    let Some(m) = RTF_HEADER.find(text) else {
        return body.to_vec();
    };
    let mut out = Vec::with_capacity(body.len() + RTF_BANNER.len());
    out.extend_from_slice(text[..m.end()].as_bytes());
    out.extend_from_slice(RTF_BANNER.as_bytes());
    out.extend_from_slice(text[m.end()..].as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::{HTML_BANNER, PLAIN_TEXT_BANNER, insert_rtf_banner};

    #[test]
    fn plain_and_html_banners_are_well_formed() {
        assert!(PLAIN_TEXT_BANNER.starts_with("** WARNING"));
        assert!(HTML_BANNER.contains("<h3>"));
        assert!(HTML_BANNER.contains("<hr/>"));
        assert!(HTML_BANNER.contains("<p>"));
    }

    #[test]
    fn rtf_banner_inserted_after_simple_preamble() {
        let rtf = br"{\rtf1\ansi\deff0{\fonttbl{\f0 Arial;}}\pard Hello\par}";
        let out = insert_rtf_banner(rtf);
        let out_str = String::from_utf8(out).unwrap();
        assert!(out_str.contains("WARNING - External Message"));
        assert!(out_str.starts_with(r"{\rtf1\ansi\deff0{\fonttbl{\f0 Arial;}}"));
    }

    #[test]
    fn rtf_without_recognizable_anchor_is_untouched() {
        let rtf = b"not actually rtf at all";
        assert_eq!(insert_rtf_banner(rtf), rtf.to_vec());
    }
}
